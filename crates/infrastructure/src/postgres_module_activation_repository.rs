use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use vigil_application::ModuleActivationRepository;
use vigil_core::{AppResult, TenantId};
use vigil_domain::ModuleActivation;

use crate::postgres_error::store_error;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for per-tenant module activation rows.
#[derive(Clone)]
pub struct PostgresModuleActivationRepository {
    pool: PgPool,
}

impl PostgresModuleActivationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ModuleActivationRow {
    module_id: String,
    tenant_id: Uuid,
    is_active: bool,
    config: serde_json::Value,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl ModuleActivationRepository for PostgresModuleActivationRepository {
    async fn find_activation(
        &self,
        module_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<ModuleActivation>> {
        let row = sqlx::query_as::<_, ModuleActivationRow>(
            r#"
            SELECT module_id, tenant_id, is_active, config, updated_at
            FROM module_activations
            WHERE module_id = $1
              AND tenant_id = $2
            "#,
        )
        .bind(module_id)
        .bind(tenant_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                format!("failed to load activation of module '{module_id}' for tenant '{tenant_id}'")
                    .as_str(),
                error,
            )
        })?;

        Ok(row.map(|row| {
            ModuleActivation::new(
                row.module_id,
                TenantId::from_uuid(row.tenant_id),
                row.is_active,
                row.config,
                row.updated_at,
            )
        }))
    }

    async fn save_activation(&self, activation: ModuleActivation) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO module_activations (module_id, tenant_id, is_active, config, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (module_id, tenant_id) DO UPDATE
            SET is_active = EXCLUDED.is_active,
                config = EXCLUDED.config,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(activation.module_id())
        .bind(activation.tenant_id().as_uuid())
        .bind(activation.is_active())
        .bind(activation.config().clone())
        .bind(activation.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            store_error(
                format!(
                    "failed to save activation of module '{}' for tenant '{}'",
                    activation.module_id(),
                    activation.tenant_id()
                )
                .as_str(),
                error,
            )
        })?;

        Ok(())
    }
}
