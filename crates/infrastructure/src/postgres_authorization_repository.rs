use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use vigil_application::AuthorizationRepository;
use vigil_core::{AppError, AppResult, TenantId};
use vigil_domain::{
    Action, CapabilityCode, LegacyMembershipRole, PermissionGrant, RoleAssignment, RoleId, RoleKey,
};

use crate::postgres_error::store_error;

mod capabilities;
mod permissions;
mod roles;


/// PostgreSQL-backed repository for role, grant and capability lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleAssignmentRow {
    subject: String,
    role_id: Uuid,
    role_key: String,
    tenant_id: Option<Uuid>,
    location_id: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct LegacyMembershipRow {
    role: String,
    tenant_id: Option<Uuid>,
}

#[derive(Debug, FromRow)]
struct RoleIdRow {
    id: Uuid,
    role_key: String,
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    role_key: String,
    resource: String,
    action: String,
    field_restrictions: serde_json::Value,
    is_active: bool,
}

#[derive(Debug, FromRow)]
struct CapabilityRow {
    code: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_role_assignments_for_subject(
        &self,
        subject: &str,
        effective_at: DateTime<Utc>,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.list_role_assignments_for_subject_impl(subject, effective_at)
            .await
    }

    async fn has_role_assignments(&self, subject: &str) -> AppResult<bool> {
        self.has_role_assignments_impl(subject).await
    }

    async fn list_legacy_memberships_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<LegacyMembershipRole>> {
        self.list_legacy_memberships_for_subject_impl(subject).await
    }

    async fn find_role_ids(&self, role_keys: &[RoleKey]) -> AppResult<Vec<(RoleKey, RoleId)>> {
        self.find_role_ids_impl(role_keys).await
    }

    async fn list_permissions_for_roles(
        &self,
        role_keys: &[RoleKey],
        resource: &str,
        action: Option<Action>,
    ) -> AppResult<Vec<PermissionGrant>> {
        self.list_permissions_for_roles_impl(role_keys, resource, action)
            .await
    }

    async fn list_capabilities_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<CapabilityCode>> {
        self.list_capabilities_for_roles_impl(role_ids).await
    }

    async fn list_capability_catalog(&self) -> AppResult<Vec<CapabilityCode>> {
        self.list_capability_catalog_impl().await
    }
}

fn role_key_values(role_keys: &[RoleKey]) -> Vec<String> {
    role_keys
        .iter()
        .map(|role_key| role_key.as_str().to_owned())
        .collect()
}
