use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vigil_core::{AppResult, NonEmptyString, TenantId};

/// Static identity of a feature module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    id: NonEmptyString,
    name: NonEmptyString,
    version: NonEmptyString,
}

impl ModuleDescriptor {
    /// Creates a validated module descriptor.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            id: NonEmptyString::new(id)?,
            name: NonEmptyString::new(name)?,
            version: NonEmptyString::new(version)?,
        })
    }

    /// Returns the unique module id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.id.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the module version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }
}

/// Activation state of one module for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleActivation {
    module_id: String,
    tenant_id: TenantId,
    is_active: bool,
    config: Value,
    updated_at: DateTime<Utc>,
}

impl ModuleActivation {
    /// Creates an activation row.
    #[must_use]
    pub fn new(
        module_id: impl Into<String>,
        tenant_id: TenantId,
        is_active: bool,
        config: Value,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            module_id: module_id.into(),
            tenant_id,
            is_active,
            config,
            updated_at,
        }
    }

    /// Returns the module id.
    #[must_use]
    pub fn module_id(&self) -> &str {
        self.module_id.as_str()
    }

    /// Returns the tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns whether the module is active for the tenant.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the tenant-specific module configuration.
    #[must_use]
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Returns when the row last changed.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns a copy with a new active flag, keeping the configuration.
    #[must_use]
    pub fn with_active(mut self, is_active: bool, updated_at: DateTime<Utc>) -> Self {
        self.is_active = is_active;
        self.updated_at = updated_at;
        self
    }

    /// Returns a copy with a new configuration, keeping the active flag.
    #[must_use]
    pub fn with_config(mut self, config: Value, updated_at: DateTime<Utc>) -> Self {
        self.config = config;
        self.updated_at = updated_at;
        self
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use vigil_core::TenantId;

    use super::{ModuleActivation, ModuleDescriptor};

    #[test]
    fn module_descriptor_requires_non_empty_values() {
        assert!(ModuleDescriptor::new("", "Training", "1.0.0").is_err());
        assert!(ModuleDescriptor::new("training", "Training", " ").is_err());
    }

    #[test]
    fn deactivation_keeps_configuration() {
        let activation = ModuleActivation::new(
            "training",
            TenantId::new(),
            true,
            json!({ "reminder_days": 30 }),
            Utc::now(),
        );

        let deactivated = activation.with_active(false, Utc::now());
        assert!(!deactivated.is_active());
        assert_eq!(deactivated.config(), &json!({ "reminder_days": 30 }));
    }
}
