use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use vigil_application::ModuleActivationRepository;
use vigil_core::{AppResult, TenantId};
use vigil_domain::ModuleActivation;

/// In-memory module activation repository.
#[derive(Debug, Default)]
pub struct InMemoryModuleActivationRepository {
    activations: RwLock<HashMap<(String, TenantId), ModuleActivation>>,
}

impl InMemoryModuleActivationRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModuleActivationRepository for InMemoryModuleActivationRepository {
    async fn find_activation(
        &self,
        module_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<ModuleActivation>> {
        Ok(self
            .activations
            .read()
            .await
            .get(&(module_id.to_owned(), tenant_id))
            .cloned())
    }

    async fn save_activation(&self, activation: ModuleActivation) -> AppResult<()> {
        let key = (activation.module_id().to_owned(), activation.tenant_id());
        self.activations.write().await.insert(key, activation);
        Ok(())
    }
}
