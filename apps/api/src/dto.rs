mod authorization;
mod common;
mod modules;

pub use authorization::{
    AuthorizationDecisionResponse, CapabilityCheckResponse, EvaluateAuthorizationRequest,
    FieldRestrictionsResponse, IdentityRequest, PermissionCheckRequest, PermissionCheckResponse,
};
pub use common::{HealthDependencyStatus, HealthResponse};
pub use modules::{ModuleDependenciesResponse, ModuleResponse, TenantModulesResponse};
