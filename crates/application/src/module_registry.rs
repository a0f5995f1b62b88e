use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;
use vigil_core::{AppError, AppResult, TenantId};

use crate::Module;

mod activation;
mod graph;

#[cfg(test)]
mod tests;

pub use activation::StoreBackedModule;

/// Registry of feature modules keyed by unique id.
///
/// Populate it at startup, then share it behind an `Arc`; once shared it can
/// no longer be mutated.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Module>>,
    registration_order: Vec<String>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module. The dependency graph is not validated here.
    pub fn register(&mut self, module: Arc<dyn Module>) -> AppResult<()> {
        let module_id = module.id().to_owned();
        if self.modules.contains_key(&module_id) {
            return Err(AppError::Configuration(format!(
                "module '{module_id}' is already registered"
            )));
        }

        self.registration_order.push(module_id.clone());
        self.modules.insert(module_id, module);
        Ok(())
    }

    /// Removes a module, returning it if it was registered.
    pub fn unregister(&mut self, module_id: &str) -> Option<Arc<dyn Module>> {
        let removed = self.modules.remove(module_id)?;
        self.registration_order.retain(|id| id != module_id);
        Some(removed)
    }

    /// Returns a registered module.
    #[must_use]
    pub fn get(&self, module_id: &str) -> Option<Arc<dyn Module>> {
        self.modules.get(module_id).cloned()
    }

    /// Returns a registered module or a not-found error.
    pub fn require(&self, module_id: &str) -> AppResult<Arc<dyn Module>> {
        self.get(module_id)
            .ok_or_else(|| AppError::NotFound(format!("module '{module_id}' is not registered")))
    }

    /// Returns whether a module id is registered.
    #[must_use]
    pub fn has(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    /// Returns every registered module in registration order.
    #[must_use]
    pub fn all_modules(&self) -> Vec<Arc<dyn Module>> {
        self.registration_order
            .iter()
            .filter_map(|id| self.modules.get(id).cloned())
            .collect()
    }

    /// Computes the dependency tree of every registered module, surfacing cycles.
    pub fn validate(&self) -> AppResult<()> {
        for module_id in &self.registration_order {
            self.dependency_tree(module_id)?;
        }
        Ok(())
    }

    /// Returns modules active for the tenant, in registration order.
    ///
    /// Modules are checked concurrently. A module whose check fails is
    /// reported inactive.
    pub async fn active_modules(&self, tenant_id: TenantId) -> Vec<Arc<dyn Module>> {
        let mut checks = JoinSet::new();
        for (position, module) in self.all_modules().into_iter().enumerate() {
            checks.spawn(async move {
                let result = module.is_active(tenant_id).await;
                (position, module, result)
            });
        }

        let mut active = Vec::new();
        while let Some(joined) = checks.join_next().await {
            match joined {
                Ok((position, module, Ok(true))) => active.push((position, module)),
                Ok((_, _, Ok(false))) => {}
                Ok((_, module, Err(error))) => {
                    warn!(
                        module_id = %module.id(),
                        tenant_id = %tenant_id,
                        error = %error,
                        "module activation check failed, treating module as inactive"
                    );
                }
                Err(error) => {
                    warn!(
                        tenant_id = %tenant_id,
                        error = %error,
                        "module activation check aborted"
                    );
                }
            }
        }

        active.sort_by_key(|(position, _)| *position);
        active.into_iter().map(|(_, module)| module).collect()
    }

    /// Returns the dependencies of a module that are not active for the tenant.
    ///
    /// The registry never acts on this; callers decide whether to block
    /// activation.
    pub async fn missing_dependencies(
        &self,
        module_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Vec<Arc<dyn Module>>> {
        let mut tree = self.dependency_tree(module_id)?;
        tree.pop();

        let mut missing = Vec::new();
        for dependency in tree {
            if !dependency.is_active(tenant_id).await? {
                missing.push(dependency);
            }
        }
        Ok(missing)
    }
}
