use super::*;

impl PostgresAuthorizationRepository {
    pub(super) async fn list_capabilities_for_roles_impl(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<CapabilityCode>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids: Vec<Uuid> = role_ids.iter().map(RoleId::as_uuid).collect();
        let rows = sqlx::query_as::<_, CapabilityRow>(
            r#"
            SELECT DISTINCT capability_code AS code
            FROM role_capabilities
            WHERE role_id = ANY($1)
            ORDER BY code
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to load role capabilities", error))?;

        decode_capabilities(rows)
    }

    pub(super) async fn list_capability_catalog_impl(&self) -> AppResult<Vec<CapabilityCode>> {
        let rows = sqlx::query_as::<_, CapabilityRow>(
            r#"
            SELECT code
            FROM capabilities
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to load capability catalog", error))?;

        decode_capabilities(rows)
    }
}

fn decode_capabilities(rows: Vec<CapabilityRow>) -> AppResult<Vec<CapabilityCode>> {
    rows.into_iter()
        .map(|row| {
            CapabilityCode::new(row.code.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode capability '{}': {error}",
                    row.code
                ))
            })
        })
        .collect()
}
