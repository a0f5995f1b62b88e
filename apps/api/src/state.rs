use sqlx::PgPool;
use vigil_application::AppContext;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub app_context: AppContext,
    pub postgres_pool: PgPool,
}
