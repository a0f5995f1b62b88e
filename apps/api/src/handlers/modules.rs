use axum::Json;
use axum::extract::{Path, State};
use vigil_application::ModuleRegistry;
use vigil_core::TenantId;

use crate::dto::{ModuleDependenciesResponse, ModuleResponse, TenantModulesResponse};
use crate::error::ApiResult;
use crate::state::AppState;


pub async fn tenant_modules_handler(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> ApiResult<Json<TenantModulesResponse>> {
    let tenant_id = tenant_id.parse::<TenantId>()?;
    Ok(Json(
        tenant_modules(state.app_context.module_registry(), tenant_id).await,
    ))
}

pub async fn module_dependencies_handler(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> ApiResult<Json<ModuleDependenciesResponse>> {
    Ok(Json(module_dependencies(
        state.app_context.module_registry(),
        module_id.as_str(),
    )?))
}

pub(crate) async fn tenant_modules(
    registry: &ModuleRegistry,
    tenant_id: TenantId,
) -> TenantModulesResponse {
    let modules = registry.active_modules(tenant_id).await;
    TenantModulesResponse {
        tenant_id: tenant_id.to_string(),
        modules: modules.iter().map(ModuleResponse::from).collect(),
    }
}

pub(crate) fn module_dependencies(
    registry: &ModuleRegistry,
    module_id: &str,
) -> ApiResult<ModuleDependenciesResponse> {
    registry.require(module_id)?;
    let tree = registry.dependency_tree(module_id)?;

    Ok(ModuleDependenciesResponse {
        module_id: module_id.to_owned(),
        dependency_tree: tree.iter().map(ModuleResponse::from).collect(),
    })
}
