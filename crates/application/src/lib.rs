//! Application services and ports.

#![forbid(unsafe_code)]

mod app_context;
mod authorization_ports;
mod authorization_service;
mod module_ports;
mod module_registry;

pub use app_context::AppContext;
pub use authorization_ports::AuthorizationRepository;
pub use authorization_service::{
    AuthorizationConfig, AuthorizationScope, AuthorizationService, CapabilityResolution,
    CapabilityStrategy, ResolvedAuthorizationView, RoleLinksStrategy, SuperAdminCatalogStrategy,
    TokenClaimsStrategy,
};
pub use module_ports::{Module, ModuleActivationRepository};
pub use module_registry::{ModuleRegistry, StoreBackedModule};
