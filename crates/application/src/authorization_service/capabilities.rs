use async_trait::async_trait;
use tracing::debug;
use vigil_domain::{CapabilityCode, RoleId};

use super::*;

/// Capability set together with the tier that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResolution {
    /// Tier that produced the set.
    pub source: CapabilitySource,
    /// Resolved capability codes.
    pub capabilities: CapabilitySet,
}

impl CapabilityResolution {
    fn empty() -> Self {
        Self {
            source: CapabilitySource::None,
            capabilities: CapabilitySet::new(),
        }
    }
}

/// One tier of capability resolution.
///
/// Tiers run in order; the first one returning a non-empty set wins.
#[async_trait]
pub trait CapabilityStrategy: Send + Sync {
    /// Returns the tier identity recorded on the resolution.
    fn source(&self) -> CapabilitySource;

    /// Attempts to resolve the subject's capabilities. `None` defers to the next tier.
    async fn try_resolve(&self, scope: &AuthorizationScope) -> Option<CapabilitySet>;
}

/// Fast path: codes pre-issued on the identity token. Performs no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenClaimsStrategy;

#[async_trait]
impl CapabilityStrategy for TokenClaimsStrategy {
    fn source(&self) -> CapabilitySource {
        CapabilitySource::TokenClaims
    }

    async fn try_resolve(&self, scope: &AuthorizationScope) -> Option<CapabilitySet> {
        let identity = scope.identity();
        if !identity.is_authenticated() {
            return None;
        }

        let capabilities: CapabilitySet = identity
            .claimed_capabilities()
            .iter()
            .filter_map(|value| CapabilityCode::new(value.as_str()).ok())
            .collect();

        (!capabilities.is_empty()).then_some(capabilities)
    }
}

/// Super-admins receive the full capability catalog in one lookup.
#[derive(Clone)]
pub struct SuperAdminCatalogStrategy {
    repository: Arc<dyn AuthorizationRepository>,
}

impl SuperAdminCatalogStrategy {
    /// Creates the tier over a repository.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CapabilityStrategy for SuperAdminCatalogStrategy {
    fn source(&self) -> CapabilitySource {
        CapabilitySource::SuperAdminCatalog
    }

    async fn try_resolve(&self, scope: &AuthorizationScope) -> Option<CapabilitySet> {
        if !scope.is_super_admin().await {
            return None;
        }

        match scope
            .call_store(
                "list_capability_catalog",
                self.repository.list_capability_catalog(),
            )
            .await
        {
            Ok(catalog) => Some(catalog.into_iter().collect()),
            Err(failure) => {
                scope.log_fail_closed("list_capability_catalog", &failure);
                None
            }
        }
    }
}

/// Database fallback: codes linked to the subject's active roles.
#[derive(Clone)]
pub struct RoleLinksStrategy {
    repository: Arc<dyn AuthorizationRepository>,
}

impl RoleLinksStrategy {
    /// Creates the tier over a repository.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl CapabilityStrategy for RoleLinksStrategy {
    fn source(&self) -> CapabilitySource {
        CapabilitySource::RoleLinks
    }

    async fn try_resolve(&self, scope: &AuthorizationScope) -> Option<CapabilitySet> {
        let role_ids: Vec<RoleId> = scope
            .active_roles()
            .await
            .iter()
            .map(RoleAssignment::role_id)
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if role_ids.is_empty() {
            return None;
        }

        match scope
            .call_store(
                "list_capabilities_for_roles",
                self.repository.list_capabilities_for_roles(&role_ids),
            )
            .await
        {
            Ok(codes) => Some(codes.into_iter().collect()),
            Err(failure) => {
                scope.log_fail_closed("list_capabilities_for_roles", &failure);
                None
            }
        }
    }
}

impl AuthorizationScope {
    /// Returns the subject's capability set, resolving it once per scope.
    pub async fn capabilities(&self) -> &CapabilitySet {
        &self.capability_resolution().await.capabilities
    }

    /// Returns the capability set and the tier that produced it.
    pub async fn capability_resolution(&self) -> &CapabilityResolution {
        self.capabilities
            .get_or_init(|| self.resolve_capabilities())
            .await
    }

    /// Returns whether the subject holds the capability.
    pub async fn has_capability(&self, code: &str) -> bool {
        self.capabilities()
            .await
            .iter()
            .any(|capability| capability.as_str() == code)
    }

    /// Returns whether the subject holds every capability. True for an empty list.
    pub async fn has_all_capabilities<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let capabilities = self.capabilities().await;
        codes.into_iter().all(|code| {
            capabilities
                .iter()
                .any(|capability| capability.as_str() == code.as_ref())
        })
    }

    /// Returns whether the subject holds at least one capability. False for an empty list.
    pub async fn has_any_capability<I, S>(&self, codes: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let capabilities = self.capabilities().await;
        codes.into_iter().any(|code| {
            capabilities
                .iter()
                .any(|capability| capability.as_str() == code.as_ref())
        })
    }

    /// Ensures the subject holds the capability.
    pub async fn require_capability(&self, code: &str) -> AppResult<()> {
        if self.has_capability(code).await {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing capability '{code}'",
            self.identity.subject()
        )))
    }

    async fn resolve_capabilities(&self) -> CapabilityResolution {
        let strategies = self.service.capability_strategies.clone();
        for strategy in strategies.iter() {
            let Some(capabilities) = strategy.try_resolve(self).await else {
                continue;
            };
            if capabilities.is_empty() {
                continue;
            }

            debug!(
                subject = %self.identity.subject(),
                source = strategy.source().as_str(),
                count = capabilities.len(),
                "resolved capabilities"
            );
            return CapabilityResolution {
                source: strategy.source(),
                capabilities,
            };
        }

        CapabilityResolution::empty()
    }
}
