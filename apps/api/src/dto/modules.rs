use std::sync::Arc;

use serde::Serialize;
use ts_rs::TS;
use vigil_application::Module;

/// API representation of a registered module.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/module-response.ts"
)]
pub struct ModuleResponse {
    pub id: String,
    pub name: String,
    pub version: String,
}

impl From<&Arc<dyn Module>> for ModuleResponse {
    fn from(module: &Arc<dyn Module>) -> Self {
        let descriptor = module.descriptor();
        Self {
            id: descriptor.id().to_owned(),
            name: descriptor.name().to_owned(),
            version: descriptor.version().to_owned(),
        }
    }
}

/// Modules active for one tenant, in registration order.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/tenant-modules-response.ts"
)]
pub struct TenantModulesResponse {
    pub tenant_id: String,
    pub modules: Vec<ModuleResponse>,
}

/// Dependency tree of a module; dependencies come before dependents and
/// the module itself is last.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/module-dependencies-response.ts"
)]
pub struct ModuleDependenciesResponse {
    pub module_id: String,
    pub dependency_tree: Vec<ModuleResponse>,
}
