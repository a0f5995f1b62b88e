//! Vigil API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod module_catalog;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;
use vigil_application::{AppContext, AuthorizationService};
use vigil_core::AppError;
use vigil_infrastructure::{PostgresAuthorizationRepository, PostgresModuleActivationRepository};

use crate::api_config::{ApiConfig, init_tracing};
use crate::module_catalog::build_module_registry;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let authorization_service =
        AuthorizationService::new(authorization_repository, config.authorization_config());

    let module_activation_repository =
        Arc::new(PostgresModuleActivationRepository::new(pool.clone()));
    let module_registry = build_module_registry(module_activation_repository)?;
    let app_context = AppContext::new(authorization_service, module_registry)?;
    info!(
        modules = app_context.module_registry().all_modules().len(),
        "module registry validated"
    );

    let app_state = AppState {
        app_context,
        postgres_pool: pool,
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/authorization/evaluate",
            post(handlers::authorization::evaluate_authorization_handler),
        )
        .route(
            "/api/tenants/{tenant_id}/modules",
            get(handlers::modules::tenant_modules_handler),
        )
        .route(
            "/api/modules/{module_id}/dependencies",
            get(handlers::modules::module_dependencies_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "vigil-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
