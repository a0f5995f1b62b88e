use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::{AppError, AppResult, NonEmptyString};

/// Opaque semantic permission such as `can_sign_training`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityCode(NonEmptyString);

impl CapabilityCode {
    /// Creates a validated capability code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        Ok(Self(NonEmptyString::new(value.trim())?))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for CapabilityCode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl Display for CapabilityCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Deduplicated, ordered set of capability codes.
pub type CapabilitySet = BTreeSet<CapabilityCode>;

/// Resolution tier that produced a subject's capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySource {
    /// Codes pre-issued on the identity token.
    TokenClaims,
    /// Full catalog enumerated for a super-admin.
    SuperAdminCatalog,
    /// Codes linked to the subject's active roles in the store.
    RoleLinks,
    /// No tier produced a result.
    None,
}

impl CapabilitySource {
    /// Returns a stable value for logs and payloads.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TokenClaims => "token_claims",
            Self::SuperAdminCatalog => "super_admin_catalog",
            Self::RoleLinks => "role_links",
            Self::None => "none",
        }
    }
}
