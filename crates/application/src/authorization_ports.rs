use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vigil_core::AppResult;
use vigil_domain::{
    Action, CapabilityCode, LegacyMembershipRole, PermissionGrant, RoleAssignment, RoleId, RoleKey,
};

/// Repository port for every lookup the authorization resolvers depend on.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists role assignments for a subject.
    ///
    /// Implementations may pre-filter rows expired at `effective_at`; the
    /// resolver filters again either way.
    async fn list_role_assignments_for_subject(
        &self,
        subject: &str,
        effective_at: DateTime<Utc>,
    ) -> AppResult<Vec<RoleAssignment>>;

    /// Returns whether the subject has any role assignment row at all,
    /// including expired and deactivated ones.
    async fn has_role_assignments(&self, subject: &str) -> AppResult<bool>;

    /// Lists coarse membership roles written by older platform versions.
    async fn list_legacy_memberships_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<LegacyMembershipRole>>;

    /// Resolves role row identifiers for role keys; unknown keys are omitted.
    async fn find_role_ids(&self, role_keys: &[RoleKey]) -> AppResult<Vec<(RoleKey, RoleId)>>;

    /// Lists active grants on a resource bound to any of the role keys.
    ///
    /// `action` of `None` returns grants for every action.
    async fn list_permissions_for_roles(
        &self,
        role_keys: &[RoleKey],
        resource: &str,
        action: Option<Action>,
    ) -> AppResult<Vec<PermissionGrant>>;

    /// Lists capability codes linked to any of the roles.
    async fn list_capabilities_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<CapabilityCode>>;

    /// Lists every capability code known to the platform.
    async fn list_capability_catalog(&self) -> AppResult<Vec<CapabilityCode>>;
}
