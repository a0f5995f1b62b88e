use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use vigil_application::ModuleActivationRepository;
use vigil_core::TenantId;
use vigil_domain::ModuleActivation;

use super::PostgresModuleActivationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres module activation tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn save_activation_upserts_per_tenant() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresModuleActivationRepository::new(pool);
    let tenant_id = TenantId::new();
    let other_tenant = TenantId::new();

    let initial = ModuleActivation::new("training", tenant_id, true, json!({}), Utc::now());
    assert!(repository.save_activation(initial.clone()).await.is_ok());

    let updated = initial.with_config(json!({ "reminder_days": 30 }), Utc::now());
    assert!(repository.save_activation(updated).await.is_ok());

    let stored = repository.find_activation("training", tenant_id).await;
    assert!(stored.is_ok());
    let stored = stored.ok().flatten();
    assert_eq!(stored.as_ref().map(ModuleActivation::is_active), Some(true));
    assert_eq!(
        stored.map(|activation| activation.config().clone()),
        Some(json!({ "reminder_days": 30 }))
    );

    let other = repository.find_activation("training", other_tenant).await;
    assert!(matches!(other, Ok(None)));
}
