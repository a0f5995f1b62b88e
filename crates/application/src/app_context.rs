use std::sync::Arc;

use vigil_core::AppResult;

use crate::{AuthorizationService, ModuleRegistry};

/// Services shared by every request once startup has finished.
#[derive(Clone)]
pub struct AppContext {
    authorization_service: AuthorizationService,
    module_registry: Arc<ModuleRegistry>,
}

impl AppContext {
    /// Freezes the module registry after validating its dependency graph.
    pub fn new(
        authorization_service: AuthorizationService,
        module_registry: ModuleRegistry,
    ) -> AppResult<Self> {
        module_registry.validate()?;

        Ok(Self {
            authorization_service,
            module_registry: Arc::new(module_registry),
        })
    }

    /// Returns the authorization service.
    #[must_use]
    pub fn authorization_service(&self) -> &AuthorizationService {
        &self.authorization_service
    }

    /// Returns the frozen module registry.
    #[must_use]
    pub fn module_registry(&self) -> &ModuleRegistry {
        &self.module_registry
    }
}
