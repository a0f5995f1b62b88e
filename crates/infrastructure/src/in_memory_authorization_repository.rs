use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use vigil_application::AuthorizationRepository;
use vigil_core::AppResult;
use vigil_domain::{
    Action, CapabilityCode, LegacyMembershipRole, PermissionGrant, RoleAssignment, RoleId, RoleKey,
};


/// In-memory authorization repository for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRepository {
    roles: RwLock<HashMap<RoleKey, RoleId>>,
    assignments: RwLock<Vec<RoleAssignment>>,
    legacy_memberships: RwLock<Vec<(String, LegacyMembershipRole)>>,
    grants: RwLock<Vec<PermissionGrant>>,
    role_capabilities: RwLock<HashMap<RoleId, BTreeSet<CapabilityCode>>>,
    catalog: RwLock<BTreeSet<CapabilityCode>>,
}

impl InMemoryAuthorizationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of a role, creating the role when missing.
    pub async fn ensure_role(&self, role_key: RoleKey) -> RoleId {
        *self
            .roles
            .write()
            .await
            .entry(role_key)
            .or_insert_with(RoleId::new)
    }

    /// Stores a role assignment as-is.
    pub async fn assign_role(&self, assignment: RoleAssignment) {
        self.assignments.write().await.push(assignment);
    }

    /// Stores a coarse membership for a subject.
    pub async fn add_legacy_membership(
        &self,
        subject: impl Into<String>,
        membership: LegacyMembershipRole,
    ) {
        self.legacy_memberships
            .write()
            .await
            .push((subject.into(), membership));
    }

    /// Stores a permission grant.
    pub async fn grant_permission(&self, grant: PermissionGrant) {
        self.grants.write().await.push(grant);
    }

    /// Links a capability to a role and adds it to the catalog.
    pub async fn link_capability(&self, role_id: RoleId, capability: CapabilityCode) {
        self.catalog.write().await.insert(capability.clone());
        self.role_capabilities
            .write()
            .await
            .entry(role_id)
            .or_default()
            .insert(capability);
    }

    /// Adds a capability to the catalog without linking it to a role.
    pub async fn add_catalog_capability(&self, capability: CapabilityCode) {
        self.catalog.write().await.insert(capability);
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationRepository {
    async fn list_role_assignments_for_subject(
        &self,
        subject: &str,
        effective_at: DateTime<Utc>,
    ) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|assignment| {
                assignment.subject() == subject && assignment.is_effective_at(effective_at)
            })
            .cloned()
            .collect())
    }

    async fn has_role_assignments(&self, subject: &str) -> AppResult<bool> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .any(|assignment| assignment.subject() == subject))
    }

    async fn list_legacy_memberships_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<LegacyMembershipRole>> {
        Ok(self
            .legacy_memberships
            .read()
            .await
            .iter()
            .filter(|(stored_subject, _)| stored_subject == subject)
            .map(|(_, membership)| membership.clone())
            .collect())
    }

    async fn find_role_ids(&self, role_keys: &[RoleKey]) -> AppResult<Vec<(RoleKey, RoleId)>> {
        let roles = self.roles.read().await;
        Ok(role_keys
            .iter()
            .filter_map(|role_key| {
                roles
                    .get(role_key)
                    .map(|role_id| (role_key.clone(), *role_id))
            })
            .collect())
    }

    async fn list_permissions_for_roles(
        &self,
        role_keys: &[RoleKey],
        resource: &str,
        action: Option<Action>,
    ) -> AppResult<Vec<PermissionGrant>> {
        Ok(self
            .grants
            .read()
            .await
            .iter()
            .filter(|grant| {
                grant.is_active()
                    && grant.resource() == resource
                    && role_keys.contains(grant.role_key())
                    && action.is_none_or(|action| grant.action() == action)
            })
            .cloned()
            .collect())
    }

    async fn list_capabilities_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<CapabilityCode>> {
        let role_capabilities = self.role_capabilities.read().await;
        let capabilities: BTreeSet<CapabilityCode> = role_ids
            .iter()
            .filter_map(|role_id| role_capabilities.get(role_id))
            .flatten()
            .cloned()
            .collect();
        Ok(capabilities.into_iter().collect())
    }

    async fn list_capability_catalog(&self) -> AppResult<Vec<CapabilityCode>> {
        Ok(self.catalog.read().await.iter().cloned().collect())
    }
}
