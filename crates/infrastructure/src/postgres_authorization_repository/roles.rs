use super::*;

impl PostgresAuthorizationRepository {
    pub(super) async fn list_role_assignments_for_subject_impl(
        &self,
        subject: &str,
        effective_at: DateTime<Utc>,
    ) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            r#"
            SELECT
                assignments.subject,
                assignments.role_id,
                roles.role_key,
                assignments.tenant_id,
                assignments.location_id,
                assignments.expires_at,
                assignments.is_active
            FROM role_assignments AS assignments
            INNER JOIN roles
                ON roles.id = assignments.role_id
            WHERE assignments.subject = $1
              AND assignments.is_active
              AND (assignments.expires_at IS NULL OR assignments.expires_at > $2)
            ORDER BY assignments.created_at, roles.role_key
            "#,
        )
        .bind(subject)
        .bind(effective_at)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                format!("failed to load role assignments for subject '{subject}'").as_str(),
                error,
            )
        })?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut assignment = RoleAssignment::new(
                    row.subject,
                    RoleId::from_uuid(row.role_id),
                    RoleKey::from(row.role_key),
                )
                .with_active(row.is_active);

                if let Some(tenant_id) = row.tenant_id {
                    assignment = assignment.with_tenant(TenantId::from_uuid(tenant_id));
                }
                if let Some(location_id) = row.location_id {
                    assignment = assignment.with_location(location_id);
                }
                if let Some(expires_at) = row.expires_at {
                    assignment = assignment.with_expiry(expires_at);
                }
                assignment
            })
            .collect())
    }

    pub(super) async fn has_role_assignments_impl(&self, subject: &str) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_assignments
                WHERE subject = $1
            )
            "#,
        )
        .bind(subject)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                format!("failed to check role assignments for subject '{subject}'").as_str(),
                error,
            )
        })
    }

    pub(super) async fn list_legacy_memberships_for_subject_impl(
        &self,
        subject: &str,
    ) -> AppResult<Vec<LegacyMembershipRole>> {
        let rows = sqlx::query_as::<_, LegacyMembershipRow>(
            r#"
            SELECT role, tenant_id
            FROM legacy_memberships
            WHERE subject = $1
            ORDER BY created_at
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                format!("failed to load legacy memberships for subject '{subject}'").as_str(),
                error,
            )
        })?;

        Ok(rows
            .into_iter()
            .map(|row| LegacyMembershipRole {
                role: row.role,
                tenant_id: row.tenant_id.map(TenantId::from_uuid),
            })
            .collect())
    }

    pub(super) async fn find_role_ids_impl(
        &self,
        role_keys: &[RoleKey],
    ) -> AppResult<Vec<(RoleKey, RoleId)>> {
        if role_keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, RoleIdRow>(
            r#"
            SELECT id, role_key
            FROM roles
            WHERE role_key = ANY($1)
            ORDER BY role_key
            "#,
        )
        .bind(role_key_values(role_keys))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to resolve role ids", error))?;

        Ok(rows
            .into_iter()
            .map(|row| (RoleKey::from(row.role_key), RoleId::from_uuid(row.id)))
            .collect())
    }
}
