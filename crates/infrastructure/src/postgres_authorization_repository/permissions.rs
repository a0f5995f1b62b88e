use std::collections::BTreeMap;
use std::str::FromStr;

use vigil_domain::FieldVisibility;

use super::*;

impl PostgresAuthorizationRepository {
    pub(super) async fn list_permissions_for_roles_impl(
        &self,
        role_keys: &[RoleKey],
        resource: &str,
        action: Option<Action>,
    ) -> AppResult<Vec<PermissionGrant>> {
        if role_keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT
                roles.role_key,
                permissions.resource,
                permissions.action,
                permissions.field_restrictions,
                permissions.is_active
            FROM role_permissions AS permissions
            INNER JOIN roles
                ON roles.id = permissions.role_id
            WHERE roles.role_key = ANY($1)
              AND permissions.resource = $2
              AND permissions.is_active
              AND ($3::TEXT IS NULL OR permissions.action = $3)
            ORDER BY roles.role_key, permissions.action
            "#,
        )
        .bind(role_key_values(role_keys))
        .bind(resource)
        .bind(action.map(|action| action.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                format!("failed to load permissions for resource '{resource}'").as_str(),
                error,
            )
        })?;

        rows.into_iter().map(grant_from_row).collect()
    }
}

fn grant_from_row(row: PermissionRow) -> AppResult<PermissionGrant> {
    let action = Action::from_str(row.action.as_str()).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode action '{}' on resource '{}': {error}",
            row.action, row.resource
        ))
    })?;

    let field_restrictions =
        serde_json::from_value::<BTreeMap<String, FieldVisibility>>(row.field_restrictions)
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode field restrictions on resource '{}': {error}",
                    row.resource
                ))
            })?;

    Ok(
        PermissionGrant::new(RoleKey::from(row.role_key), row.resource, action)?
            .with_field_restrictions(field_restrictions)
            .with_active(row.is_active),
    )
}
