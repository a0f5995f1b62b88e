use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use vigil_core::{AppResult, TenantId};
use vigil_domain::{ModuleActivation, ModuleDescriptor};

/// Feature module with declared dependencies and per-tenant activation.
///
/// Dependencies are other module instances, not ids, so a registry can be
/// handed a graph that was wired before registration.
#[async_trait]
pub trait Module: Send + Sync {
    /// Returns the static module identity.
    fn descriptor(&self) -> &ModuleDescriptor;

    /// Returns direct dependencies in declaration order.
    fn dependencies(&self) -> Vec<Arc<dyn Module>>;

    /// Returns whether the module is active for the tenant.
    async fn is_active(&self, tenant_id: TenantId) -> AppResult<bool>;

    /// Activates the module for the tenant.
    async fn activate(&self, tenant_id: TenantId) -> AppResult<()>;

    /// Deactivates the module for the tenant. Dependents are not checked.
    async fn deactivate(&self, tenant_id: TenantId) -> AppResult<()>;

    /// Returns the tenant configuration.
    async fn config(&self, tenant_id: TenantId) -> AppResult<Value>;

    /// Replaces the tenant configuration.
    async fn set_config(&self, tenant_id: TenantId, config: Value) -> AppResult<()>;

    /// Returns the unique module id.
    fn id(&self) -> &str {
        self.descriptor().id()
    }
}

/// Repository port for per-tenant module activation rows.
#[async_trait]
pub trait ModuleActivationRepository: Send + Sync {
    /// Finds the activation row for a module in a tenant.
    async fn find_activation(
        &self,
        module_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<ModuleActivation>>;

    /// Inserts or replaces the activation row.
    async fn save_activation(&self, activation: ModuleActivation) -> AppResult<()>;
}
