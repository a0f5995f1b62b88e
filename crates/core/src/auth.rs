use serde::{Deserialize, Serialize};

use crate::TenantId;

/// Pre-issued claim bundle signed by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Role key issued with the token, if any.
    ///
    /// Informational only. Roles are always resolved from stored assignments;
    /// this value is echoed in resolved views for diagnostics.
    #[serde(default)]
    pub role: Option<String>,
    /// Capability codes issued with the token.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Read-only snapshot of the calling subject for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    subject: String,
    authenticated: bool,
    tenant_id: Option<TenantId>,
    super_admin: bool,
    claims: Option<IdentityClaims>,
}

impl IdentityContext {
    /// Creates an authenticated identity for a subject.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            authenticated: true,
            tenant_id: None,
            super_admin: false,
            claims: None,
        }
    }

    /// Creates an identity for a caller without a valid session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            subject: String::new(),
            authenticated: false,
            tenant_id: None,
            super_admin: false,
            claims: None,
        }
    }

    /// Scopes the identity to the tenant the request operates on.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    /// Marks the identity as a platform super-admin.
    #[must_use]
    pub fn with_super_admin(mut self, super_admin: bool) -> Self {
        self.super_admin = super_admin;
        self
    }

    /// Attaches the claim bundle issued by the identity provider.
    #[must_use]
    pub fn with_claims(mut self, claims: IdentityClaims) -> Self {
        self.claims = Some(claims);
        self
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns whether the identity provider authenticated the caller.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated && !self.subject.trim().is_empty()
    }

    /// Returns the active tenant, if the request is tenant scoped.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns whether the identity carries the super-admin flag.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.is_authenticated() && self.super_admin
    }

    /// Returns the pre-issued claim bundle, if any.
    #[must_use]
    pub fn claims(&self) -> Option<&IdentityClaims> {
        self.claims.as_ref()
    }

    /// Returns the pre-issued capability codes, empty when none were issued.
    #[must_use]
    pub fn claimed_capabilities(&self) -> &[String] {
        self.claims
            .as_ref()
            .map(|claims| claims.capabilities.as_slice())
            .unwrap_or_default()
    }
}
