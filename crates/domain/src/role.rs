use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_core::{AppError, TenantId};

/// Unique identifier for a role row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Role keys known to the platform, plus tenant-defined extensions.
///
/// Storage values are stable snake_case strings. Any value outside the known
/// set parses into [`RoleKey::Extension`] so new keys never fail to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleKey {
    /// Platform operator with unrestricted access.
    SuperAdmin,
    /// External occupational safety consultant serving client companies.
    ConsultantSsm,
    /// Administrator of one client company.
    FirmaAdmin,
    /// Internal safety officer of a client company.
    ResponsabilSsm,
    /// Occupational medicine physician.
    MedicMuncii,
    /// Labour inspector with read-mostly access.
    Inspector,
    /// Employee of a client company.
    Angajat,
    /// Read-only observer.
    Viewer,
    /// Role key not known to this build.
    Extension(String),
}

impl RoleKey {
    /// Returns a stable storage value for this role key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::ConsultantSsm => "consultant_ssm",
            Self::FirmaAdmin => "firma_admin",
            Self::ResponsabilSsm => "responsabil_ssm",
            Self::MedicMuncii => "medic_muncii",
            Self::Inspector => "inspector",
            Self::Angajat => "angajat",
            Self::Viewer => "viewer",
            Self::Extension(value) => value.as_str(),
        }
    }

    /// Returns all built-in role keys.
    #[must_use]
    pub fn known() -> &'static [Self] {
        const KNOWN: &[RoleKey] = &[
            RoleKey::SuperAdmin,
            RoleKey::ConsultantSsm,
            RoleKey::FirmaAdmin,
            RoleKey::ResponsabilSsm,
            RoleKey::MedicMuncii,
            RoleKey::Inspector,
            RoleKey::Angajat,
            RoleKey::Viewer,
        ];

        KNOWN
    }

    /// Returns whether the key grants unrestricted access.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Returns whether the key is outside the built-in set.
    #[must_use]
    pub fn is_extension(&self) -> bool {
        matches!(self, Self::Extension(_))
    }
}

impl From<String> for RoleKey {
    fn from(value: String) -> Self {
        let normalized = value.trim();
        Self::known()
            .iter()
            .find(|known| known.as_str() == normalized)
            .cloned()
            .unwrap_or_else(|| Self::Extension(normalized.to_owned()))
    }
}

impl From<RoleKey> for String {
    fn from(value: RoleKey) -> Self {
        match value {
            RoleKey::Extension(value) => value,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for RoleKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "role key must not be empty".to_owned(),
            ));
        }

        Ok(Self::from(value.to_owned()))
    }
}

impl Display for RoleKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A role granted to a subject, optionally scoped and time-boxed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    subject: String,
    role_id: RoleId,
    role_key: RoleKey,
    tenant_id: Option<TenantId>,
    location_id: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl RoleAssignment {
    /// Creates an active, unscoped, non-expiring assignment.
    #[must_use]
    pub fn new(subject: impl Into<String>, role_id: RoleId, role_key: RoleKey) -> Self {
        Self {
            subject: subject.into(),
            role_id,
            role_key,
            tenant_id: None,
            location_id: None,
            expires_at: None,
            is_active: true,
        }
    }

    /// Restricts the assignment to one tenant.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Restricts the assignment to one location of the tenant.
    #[must_use]
    pub fn with_location(mut self, location_id: impl Into<String>) -> Self {
        let location_id = location_id.into();
        self.location_id = (!location_id.trim().is_empty()).then_some(location_id);
        self
    }

    /// Sets the instant after which the assignment stops contributing.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the administrative active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the subject holding the role.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the role row identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the role key.
    #[must_use]
    pub fn role_key(&self) -> &RoleKey {
        &self.role_key
    }

    /// Returns the tenant scope, if any.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns the location scope, if any.
    #[must_use]
    pub fn location_id(&self) -> Option<&str> {
        self.location_id.as_deref()
    }

    /// Returns the expiry instant, if any.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns the administrative active flag.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the assignment contributes to resolution at `now`.
    ///
    /// An assignment expiring exactly at `now` no longer contributes.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Returns whether the assignment applies inside the requested tenant.
    ///
    /// Unscoped assignments apply everywhere. Scoped assignments only apply
    /// when the request targets the same tenant, so a request without a
    /// tenant never picks them up.
    #[must_use]
    pub fn applies_to_tenant(&self, tenant_id: Option<TenantId>) -> bool {
        match (self.tenant_id, tenant_id) {
            (None, _) => true,
            (Some(scope), Some(requested)) => scope == requested,
            (Some(_), None) => false,
        }
    }
}

/// Coarse membership role written by older versions of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyMembershipRole {
    /// Raw membership value, for example `consultant`.
    pub role: String,
    /// Tenant the membership belongs to.
    pub tenant_id: Option<TenantId>,
}

impl LegacyMembershipRole {
    /// Maps the coarse membership value onto a fine-grained role key.
    ///
    /// The mapping only runs in this direction. Unknown values map to `None`.
    #[must_use]
    pub fn mapped_role_key(&self) -> Option<RoleKey> {
        match self.role.trim() {
            "consultant" => Some(RoleKey::ConsultantSsm),
            "admin" | "company_admin" => Some(RoleKey::FirmaAdmin),
            "employee" | "member" => Some(RoleKey::Angajat),
            _ => None,
        }
    }
}
