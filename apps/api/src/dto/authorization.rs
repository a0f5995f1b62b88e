use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use vigil_core::{AppError, IdentityContext, TenantId};
use vigil_domain::FieldRestrictions;

/// Identity the caller evaluates on behalf of.
///
/// A missing or blank subject evaluates as an anonymous caller. Super-admin
/// status and token claims are not accepted here: they only come from stored
/// role assignments, and bodies carrying them are rejected.
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[serde(deny_unknown_fields)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/identity-request.ts"
)]
pub struct IdentityRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl TryFrom<IdentityRequest> for IdentityContext {
    type Error = AppError;

    fn try_from(value: IdentityRequest) -> Result<Self, Self::Error> {
        let Some(subject) = value.subject.filter(|subject| !subject.trim().is_empty()) else {
            return Ok(IdentityContext::anonymous());
        };

        let identity = IdentityContext::new(subject);
        match value.tenant_id {
            Some(tenant_id) => Ok(identity.with_tenant(tenant_id.parse::<TenantId>()?)),
            None => Ok(identity),
        }
    }
}

/// One resource/action pair to check.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-check-request.ts"
)]
pub struct PermissionCheckRequest {
    pub resource: String,
    pub action: String,
}

/// Batch of checks evaluated against one request-scoped resolution.
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/evaluate-authorization-request.ts"
)]
pub struct EvaluateAuthorizationRequest {
    pub identity: IdentityRequest,
    #[serde(default)]
    pub permissions: Vec<PermissionCheckRequest>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub field_resources: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub resource: String,
    pub action: String,
    pub allowed: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/capability-check-response.ts"
)]
pub struct CapabilityCheckResponse {
    pub code: String,
    pub granted: bool,
}

/// Field visibility for one resource. Fields not listed are visible unless
/// `deny_all` is set.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/field-restrictions-response.ts"
)]
pub struct FieldRestrictionsResponse {
    pub resource: String,
    pub deny_all: bool,
    pub fields: BTreeMap<String, String>,
}

impl FieldRestrictionsResponse {
    /// Creates a response for the restrictions resolved on a resource.
    #[must_use]
    pub fn new(resource: String, restrictions: &FieldRestrictions) -> Self {
        Self {
            resource,
            deny_all: restrictions.is_deny_all(),
            fields: restrictions
                .fields()
                .iter()
                .map(|(field, visibility)| (field.clone(), visibility.as_str().to_owned()))
                .collect(),
        }
    }
}

/// Outcome of an evaluation request.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/authorization-decision-response.ts"
)]
pub struct AuthorizationDecisionResponse {
    pub subject: String,
    pub tenant_id: Option<String>,
    pub roles: Vec<String>,
    pub capability_source: String,
    pub capabilities: Vec<String>,
    pub permissions: Vec<PermissionCheckResponse>,
    pub capability_checks: Vec<CapabilityCheckResponse>,
    pub field_restrictions: Vec<FieldRestrictionsResponse>,
}
