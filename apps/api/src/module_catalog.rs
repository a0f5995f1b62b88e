use std::sync::Arc;

use serde_json::json;
use vigil_application::{Module, ModuleActivationRepository, ModuleRegistry, StoreBackedModule};
use vigil_core::AppResult;
use vigil_domain::ModuleDescriptor;

/// Builds the registry of feature modules shipped with the platform.
///
/// `employees` is the foundation every other module reads from; `reports`
/// aggregates the operational modules.
pub fn build_module_registry(
    repository: Arc<dyn ModuleActivationRepository>,
) -> AppResult<ModuleRegistry> {
    let module = |id: &str, name: &str| -> AppResult<StoreBackedModule> {
        Ok(StoreBackedModule::new(
            ModuleDescriptor::new(id, name, env!("CARGO_PKG_VERSION"))?,
            repository.clone(),
        ))
    };

    let employees: Arc<dyn Module> = Arc::new(module("employees", "Employees")?);
    let training: Arc<dyn Module> = Arc::new(
        module("training", "Safety training")?
            .depends_on(employees.clone())
            .with_default_config(json!({ "reminder_days": 30 })),
    );
    let medical_exams: Arc<dyn Module> = Arc::new(
        module("medical_exams", "Medical examinations")?
            .depends_on(employees.clone())
            .with_default_config(json!({ "reminder_days": 14 })),
    );
    let incidents: Arc<dyn Module> =
        Arc::new(module("incidents", "Incident reporting")?.depends_on(employees.clone()));
    let reports: Arc<dyn Module> = Arc::new(
        module("reports", "Compliance reports")?
            .depends_on(training.clone())
            .depends_on(medical_exams.clone())
            .depends_on(incidents.clone()),
    );

    let mut registry = ModuleRegistry::new();
    for module in [employees, training, medical_exams, incidents, reports] {
        registry.register(module)?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vigil_infrastructure::InMemoryModuleActivationRepository;

    use super::build_module_registry;

    #[test]
    fn catalog_is_acyclic_and_orders_foundation_first() {
        let registry = build_module_registry(Arc::new(InMemoryModuleActivationRepository::new()));
        assert!(registry.is_ok());
        let Ok(registry) = registry else {
            return;
        };

        assert!(registry.validate().is_ok());

        let tree: Vec<String> = registry
            .dependency_tree("reports")
            .unwrap_or_default()
            .iter()
            .map(|module| module.id().to_owned())
            .collect();
        assert_eq!(
            tree,
            vec!["employees", "training", "medical_exams", "incidents", "reports"]
        );
    }
}
