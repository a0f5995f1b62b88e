use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use vigil_domain::{ModuleActivation, ModuleDescriptor};

use crate::ModuleActivationRepository;

use super::*;

/// Module whose activation state lives in a [`ModuleActivationRepository`].
#[derive(Clone)]
pub struct StoreBackedModule {
    descriptor: ModuleDescriptor,
    dependencies: Vec<Arc<dyn Module>>,
    repository: Arc<dyn ModuleActivationRepository>,
    default_config: Value,
}

impl StoreBackedModule {
    /// Creates a module without dependencies and with an empty default configuration.
    #[must_use]
    pub fn new(
        descriptor: ModuleDescriptor,
        repository: Arc<dyn ModuleActivationRepository>,
    ) -> Self {
        Self {
            descriptor,
            dependencies: Vec::new(),
            repository,
            default_config: Value::Object(serde_json::Map::new()),
        }
    }

    /// Appends a dependency.
    #[must_use]
    pub fn depends_on(mut self, dependency: Arc<dyn Module>) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Sets the configuration used until a tenant stores its own.
    #[must_use]
    pub fn with_default_config(mut self, default_config: Value) -> Self {
        self.default_config = default_config;
        self
    }

    async fn current(&self, tenant_id: TenantId) -> AppResult<Option<ModuleActivation>> {
        self.repository
            .find_activation(self.descriptor.id(), tenant_id)
            .await
    }
}

#[async_trait]
impl Module for StoreBackedModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn dependencies(&self) -> Vec<Arc<dyn Module>> {
        self.dependencies.clone()
    }

    async fn is_active(&self, tenant_id: TenantId) -> AppResult<bool> {
        Ok(self
            .current(tenant_id)
            .await?
            .is_some_and(|activation| activation.is_active()))
    }

    async fn activate(&self, tenant_id: TenantId) -> AppResult<()> {
        let now = Utc::now();
        let activation = match self.current(tenant_id).await? {
            Some(activation) => activation.with_active(true, now),
            None => ModuleActivation::new(
                self.descriptor.id(),
                tenant_id,
                true,
                self.default_config.clone(),
                now,
            ),
        };

        self.repository.save_activation(activation).await?;
        info!(
            module_id = %self.descriptor.id(),
            tenant_id = %tenant_id,
            "module activated"
        );
        Ok(())
    }

    async fn deactivate(&self, tenant_id: TenantId) -> AppResult<()> {
        let Some(activation) = self.current(tenant_id).await? else {
            return Ok(());
        };

        self.repository
            .save_activation(activation.with_active(false, Utc::now()))
            .await?;
        info!(
            module_id = %self.descriptor.id(),
            tenant_id = %tenant_id,
            "module deactivated"
        );
        Ok(())
    }

    async fn config(&self, tenant_id: TenantId) -> AppResult<Value> {
        Ok(self
            .current(tenant_id)
            .await?
            .map(|activation| activation.config().clone())
            .unwrap_or_else(|| self.default_config.clone()))
    }

    async fn set_config(&self, tenant_id: TenantId, config: Value) -> AppResult<()> {
        let now = Utc::now();
        let activation = match self.current(tenant_id).await? {
            Some(activation) => activation.with_config(config, now),
            None => ModuleActivation::new(self.descriptor.id(), tenant_id, false, config, now),
        };

        self.repository.save_activation(activation).await
    }
}
