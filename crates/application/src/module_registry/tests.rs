use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use vigil_core::{AppError, AppResult, TenantId};
use vigil_domain::{ModuleActivation, ModuleDescriptor};

use crate::{Module, ModuleActivationRepository};

use super::{ModuleRegistry, StoreBackedModule};

#[derive(Default)]
struct FakeActivationRepository {
    rows: Mutex<HashMap<(String, TenantId), ModuleActivation>>,
    failing_module: Option<&'static str>,
}

#[async_trait]
impl ModuleActivationRepository for FakeActivationRepository {
    async fn find_activation(
        &self,
        module_id: &str,
        tenant_id: TenantId,
    ) -> AppResult<Option<ModuleActivation>> {
        if self.failing_module == Some(module_id) {
            return Err(AppError::Unavailable("activation store offline".to_owned()));
        }
        Ok(self
            .rows
            .lock()
            .await
            .get(&(module_id.to_owned(), tenant_id))
            .cloned())
    }

    async fn save_activation(&self, activation: ModuleActivation) -> AppResult<()> {
        self.rows.lock().await.insert(
            (activation.module_id().to_owned(), activation.tenant_id()),
            activation,
        );
        Ok(())
    }
}

/// Module whose dependencies can be wired after construction, so tests can
/// build cyclic graphs.
struct LinkedModule {
    descriptor: ModuleDescriptor,
    dependencies: std::sync::Mutex<Vec<Arc<dyn Module>>>,
}

impl LinkedModule {
    fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            descriptor: descriptor(id),
            dependencies: std::sync::Mutex::new(Vec::new()),
        })
    }

    fn link(&self, dependency: Arc<dyn Module>) {
        if let Ok(mut dependencies) = self.dependencies.lock() {
            dependencies.push(dependency);
        }
    }
}

#[async_trait]
impl Module for LinkedModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn dependencies(&self) -> Vec<Arc<dyn Module>> {
        self.dependencies
            .lock()
            .map(|dependencies| dependencies.clone())
            .unwrap_or_default()
    }

    async fn is_active(&self, _tenant_id: TenantId) -> AppResult<bool> {
        Ok(false)
    }

    async fn activate(&self, _tenant_id: TenantId) -> AppResult<()> {
        Ok(())
    }

    async fn deactivate(&self, _tenant_id: TenantId) -> AppResult<()> {
        Ok(())
    }

    async fn config(&self, _tenant_id: TenantId) -> AppResult<Value> {
        Ok(Value::Null)
    }

    async fn set_config(&self, _tenant_id: TenantId, _config: Value) -> AppResult<()> {
        Ok(())
    }
}

fn descriptor(id: &str) -> ModuleDescriptor {
    match ModuleDescriptor::new(id, id.to_uppercase(), "1.0.0") {
        Ok(descriptor) => descriptor,
        Err(error) => panic!("invalid test descriptor: {error}"),
    }
}

fn ids(modules: &[Arc<dyn Module>]) -> Vec<String> {
    modules
        .iter()
        .map(|module| module.id().to_owned())
        .collect()
}

fn store_module(
    id: &str,
    repository: &Arc<FakeActivationRepository>,
    dependencies: &[Arc<dyn Module>],
) -> Arc<dyn Module> {
    let module = dependencies.iter().cloned().fold(
        StoreBackedModule::new(descriptor(id), repository.clone()),
        StoreBackedModule::depends_on,
    );
    Arc::new(module)
}

#[test]
fn dependency_tree_orders_dependencies_first() {
    let repository = Arc::new(FakeActivationRepository::default());
    let a = store_module("a", &repository, &[]);
    let b = store_module("b", &repository, &[a.clone()]);
    let c = store_module("c", &repository, &[a.clone(), b.clone()]);

    let mut registry = ModuleRegistry::new();
    for module in [a, b, c] {
        assert!(registry.register(module).is_ok());
    }

    let tree = registry.dependency_tree("c");
    assert_eq!(
        tree.map(|modules| ids(&modules)).unwrap_or_default(),
        vec!["a", "b", "c"]
    );
}

#[test]
fn dependency_tree_accepts_unregistered_dependencies() {
    let repository = Arc::new(FakeActivationRepository::default());
    let incidents = store_module("incidents", &repository, &[]);
    let reports = store_module("reports", &repository, &[incidents]);

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(reports).is_ok());

    let tree = registry.dependency_tree("reports");
    assert_eq!(
        tree.map(|modules| ids(&modules)).unwrap_or_default(),
        vec!["incidents", "reports"]
    );
}

#[test]
fn dependency_cycle_reports_full_path() {
    let x = LinkedModule::new("x");
    let y = LinkedModule::new("y");
    x.link(y.clone());
    y.link(x.clone());

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(x.clone()).is_ok());
    assert!(registry.register(y.clone()).is_ok());

    match registry.dependency_tree("x") {
        Err(AppError::Configuration(message)) => assert!(message.contains("x -> y -> x")),
        Err(error) => panic!("unexpected error: {error}"),
        Ok(tree) => panic!("expected cycle, got {:?}", ids(&tree)),
    }
    assert!(registry.validate().is_err());

    // Break the reference cycle so the test does not leak.
    if let Ok(mut dependencies) = y.dependencies.lock() {
        dependencies.clear();
    }
}

#[test]
fn self_dependency_is_a_cycle() {
    let solo = LinkedModule::new("solo");
    solo.link(solo.clone());

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(solo.clone()).is_ok());

    let result = registry.dependency_tree("solo");
    assert!(
        matches!(result, Err(AppError::Configuration(message)) if message.contains("solo -> solo"))
    );

    if let Ok(mut dependencies) = solo.dependencies.lock() {
        dependencies.clear();
    }
}

#[test]
fn deep_acyclic_chain_is_not_a_cycle() {
    let repository = Arc::new(FakeActivationRepository::default());
    let mut previous = store_module("m0", &repository, &[]);
    for index in 1..2_000 {
        previous = store_module(format!("m{index}").as_str(), &repository, &[previous]);
    }

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(previous).is_ok());

    let tree = registry.dependency_tree("m1999");
    assert_eq!(tree.map(|modules| modules.len()).unwrap_or_default(), 2_000);
}

#[test]
fn shared_dependency_is_emitted_once() {
    let repository = Arc::new(FakeActivationRepository::default());
    let base = store_module("base", &repository, &[]);
    let left = store_module("left", &repository, &[base.clone()]);
    let right = store_module("right", &repository, &[base.clone()]);
    let top = store_module("top", &repository, &[left, right]);

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(top).is_ok());

    let tree = registry.dependency_tree("top");
    assert_eq!(
        tree.map(|modules| ids(&modules)).unwrap_or_default(),
        vec!["base", "left", "right", "top"]
    );
}

#[test]
fn duplicate_registration_keeps_first_module() {
    let repository = Arc::new(FakeActivationRepository::default());
    let first = Arc::new(StoreBackedModule::new(
        match ModuleDescriptor::new("training", "Training", "1.0.0") {
            Ok(descriptor) => descriptor,
            Err(error) => panic!("invalid descriptor: {error}"),
        },
        repository.clone(),
    ));
    let second = Arc::new(StoreBackedModule::new(
        match ModuleDescriptor::new("training", "Training v2", "2.0.0") {
            Ok(descriptor) => descriptor,
            Err(error) => panic!("invalid descriptor: {error}"),
        },
        repository,
    ));

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(first).is_ok());
    assert!(matches!(
        registry.register(second),
        Err(AppError::Configuration(_))
    ));

    let kept = registry.get("training");
    assert_eq!(
        kept.map(|module| module.descriptor().version().to_owned()),
        Some("1.0.0".to_owned())
    );
    assert_eq!(registry.all_modules().len(), 1);
}

#[test]
fn unknown_module_lookups() {
    let mut registry = ModuleRegistry::new();
    assert!(!registry.has("medical"));
    assert!(registry.get("medical").is_none());
    assert!(matches!(
        registry.require("medical"),
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        registry.dependency_tree("medical"),
        Err(AppError::Configuration(_))
    ));
    assert!(registry.unregister("medical").is_none());
}

#[test]
fn unregister_removes_module_from_listing() {
    let repository = Arc::new(FakeActivationRepository::default());
    let mut registry = ModuleRegistry::new();
    assert!(registry.register(store_module("a", &repository, &[])).is_ok());
    assert!(registry.register(store_module("b", &repository, &[])).is_ok());

    assert!(registry.unregister("a").is_some());
    assert!(!registry.has("a"));
    assert_eq!(ids(&registry.all_modules()), vec!["b"]);
}

#[tokio::test]
async fn active_modules_lists_only_tenant_activations_in_order() {
    let repository = Arc::new(FakeActivationRepository::default());
    let training = store_module("training", &repository, &[]);
    let medical = store_module("medical", &repository, &[]);
    let incidents = store_module("incidents", &repository, &[]);

    let mut registry = ModuleRegistry::new();
    for module in [training.clone(), medical.clone(), incidents.clone()] {
        assert!(registry.register(module).is_ok());
    }

    let tenant_id = TenantId::new();
    let other_tenant = TenantId::new();
    assert!(incidents.activate(tenant_id).await.is_ok());
    assert!(training.activate(tenant_id).await.is_ok());
    assert!(medical.activate(other_tenant).await.is_ok());

    let active = registry.active_modules(tenant_id).await;
    assert_eq!(ids(&active), vec!["training", "incidents"]);
}

#[tokio::test]
async fn failing_activation_check_counts_as_inactive() {
    let repository = Arc::new(FakeActivationRepository {
        failing_module: Some("medical"),
        ..FakeActivationRepository::default()
    });
    let training = store_module("training", &repository, &[]);
    let medical = store_module("medical", &repository, &[]);

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(training.clone()).is_ok());
    assert!(registry.register(medical).is_ok());

    let tenant_id = TenantId::new();
    assert!(training.activate(tenant_id).await.is_ok());

    let active = registry.active_modules(tenant_id).await;
    assert_eq!(ids(&active), vec!["training"]);
}

#[tokio::test]
async fn deactivation_keeps_config_and_ignores_dependents() {
    let repository = Arc::new(FakeActivationRepository::default());
    let training = store_module("training", &repository, &[]);
    let certificates = store_module("certificates", &repository, &[training.clone()]);

    let mut registry = ModuleRegistry::new();
    assert!(registry.register(training.clone()).is_ok());
    assert!(registry.register(certificates.clone()).is_ok());

    let tenant_id = TenantId::new();
    assert!(training.activate(tenant_id).await.is_ok());
    assert!(certificates.activate(tenant_id).await.is_ok());
    assert!(
        training
            .set_config(tenant_id, json!({ "reminder_days": 14 }))
            .await
            .is_ok()
    );

    assert!(training.deactivate(tenant_id).await.is_ok());
    assert!(!training.is_active(tenant_id).await.unwrap_or(true));
    assert!(certificates.is_active(tenant_id).await.unwrap_or(false));
    assert_eq!(
        training.config(tenant_id).await.unwrap_or(Value::Null),
        json!({ "reminder_days": 14 })
    );

    let missing = registry.missing_dependencies("certificates", tenant_id).await;
    assert_eq!(
        missing.map(|modules| ids(&modules)).unwrap_or_default(),
        vec!["training"]
    );
}

#[tokio::test]
async fn config_defaults_until_tenant_stores_one() {
    let repository = Arc::new(FakeActivationRepository::default());
    let module = StoreBackedModule::new(descriptor("reports"), repository)
        .with_default_config(json!({ "format": "pdf" }));
    let tenant_id = TenantId::new();

    assert_eq!(
        module.config(tenant_id).await.unwrap_or(Value::Null),
        json!({ "format": "pdf" })
    );
    assert!(module.deactivate(tenant_id).await.is_ok());
    assert!(!module.is_active(tenant_id).await.unwrap_or(true));
}
