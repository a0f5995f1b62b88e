use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{error, warn};
use vigil_core::{AppError, AppResult, IdentityContext, TenantId};
use vigil_domain::{
    Action, CapabilitySet, CapabilitySource, FieldRestrictions, RoleAssignment, RoleKey,
};

use crate::AuthorizationRepository;

mod capabilities;
mod field_restrictions;
mod permissions;
mod roles;


pub use capabilities::{
    CapabilityResolution, CapabilityStrategy, RoleLinksStrategy, SuperAdminCatalogStrategy,
    TokenClaimsStrategy,
};

/// Tunables for authorization resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizationConfig {
    /// Budget for a single backing-store call before it fails closed.
    pub store_timeout: Duration,
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(2000),
        }
    }
}

/// Application service that opens request-scoped authorization contexts.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    capability_strategies: Arc<[Arc<dyn CapabilityStrategy>]>,
    config: AuthorizationConfig,
}

impl AuthorizationService {
    /// Creates a service with the default capability tiers:
    /// token claims, super-admin catalog, role links.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>, config: AuthorizationConfig) -> Self {
        let capability_strategies: Vec<Arc<dyn CapabilityStrategy>> = vec![
            Arc::new(TokenClaimsStrategy),
            Arc::new(SuperAdminCatalogStrategy::new(repository.clone())),
            Arc::new(RoleLinksStrategy::new(repository.clone())),
        ];

        Self {
            repository,
            capability_strategies: capability_strategies.into(),
            config,
        }
    }

    /// Replaces the ordered capability tiers.
    #[must_use]
    pub fn with_capability_strategies(
        mut self,
        capability_strategies: Vec<Arc<dyn CapabilityStrategy>>,
    ) -> Self {
        self.capability_strategies = capability_strategies.into();
        self
    }

    /// Returns the service configuration.
    #[must_use]
    pub fn config(&self) -> AuthorizationConfig {
        self.config
    }

    /// Opens a scope for one request. Drop it when the request ends.
    #[must_use]
    pub fn scope(&self, identity: IdentityContext) -> AuthorizationScope {
        self.scope_at(identity, Utc::now())
    }

    /// Opens a scope that evaluates expiry against a fixed instant.
    #[must_use]
    pub fn scope_at(&self, identity: IdentityContext, now: DateTime<Utc>) -> AuthorizationScope {
        AuthorizationScope {
            service: self.clone(),
            identity,
            now,
            roles: OnceCell::new(),
            capabilities: OnceCell::new(),
            permission_decisions: Mutex::new(HashMap::new()),
            field_restrictions: Mutex::new(BTreeMap::new()),
        }
    }

    /// Resolves the role row id for a role key.
    pub async fn require_role_id(&self, role_key: &RoleKey) -> AppResult<vigil_domain::RoleId> {
        let role_ids = self
            .repository
            .find_role_ids(std::slice::from_ref(role_key))
            .await?;

        role_ids
            .into_iter()
            .find_map(|(key, role_id)| (&key == role_key).then_some(role_id))
            .ok_or_else(|| AppError::NotFound(format!("role key '{role_key}' does not exist")))
    }
}

/// Memoized authorization decisions for one subject within one request.
///
/// Nothing cached here outlives the scope, so a role change is visible to
/// the next request.
pub struct AuthorizationScope {
    service: AuthorizationService,
    identity: IdentityContext,
    now: DateTime<Utc>,
    roles: OnceCell<Vec<RoleAssignment>>,
    capabilities: OnceCell<CapabilityResolution>,
    permission_decisions: Mutex<HashMap<(String, Action), bool>>,
    field_restrictions: Mutex<BTreeMap<String, FieldRestrictions>>,
}

impl AuthorizationScope {
    /// Returns the identity the scope resolves for.
    #[must_use]
    pub fn identity(&self) -> &IdentityContext {
        &self.identity
    }

    /// Returns the instant expiry is evaluated against.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the repository used by this scope.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn AuthorizationRepository> {
        &self.service.repository
    }

    /// Runs one store call under the configured timeout.
    ///
    /// A timeout becomes [`AppError::Unavailable`]; the call is never retried.
    pub async fn call_store<T, F>(&self, operation: &str, future: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>> + Send,
    {
        let store_timeout = self.service.config.store_timeout;
        match tokio::time::timeout(store_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Unavailable(format!(
                "{operation} timed out after {}ms",
                store_timeout.as_millis()
            ))),
        }
    }

    /// Logs a store failure that is being downgraded to a fail-closed result.
    pub fn log_fail_closed(&self, operation: &str, failure: &AppError) {
        if failure.is_transient() {
            warn!(
                subject = %self.identity.subject(),
                operation,
                error = %failure,
                "authorization store unavailable, failing closed"
            );
        } else {
            error!(
                subject = %self.identity.subject(),
                operation,
                error = %failure,
                "authorization store failed, failing closed"
            );
        }
    }

    /// Builds the request-scoped aggregate of everything resolved so far,
    /// resolving roles and capabilities if they are still pending.
    pub async fn resolved_view(&self) -> ResolvedAuthorizationView {
        let roles = self
            .active_roles()
            .await
            .iter()
            .map(|assignment| assignment.role_key().clone())
            .collect();
        let resolution = self.capability_resolution().await;
        let field_restrictions = self.field_restrictions.lock().await.clone();

        ResolvedAuthorizationView {
            subject: self.identity.subject().to_owned(),
            tenant_id: self.identity.tenant_id(),
            claimed_role: self
                .identity
                .claims()
                .and_then(|claims| claims.role.clone()),
            roles,
            capabilities: resolution.capabilities.clone(),
            capability_source: resolution.source,
            field_restrictions,
        }
    }
}

/// Ephemeral aggregate of one request's authorization state. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedAuthorizationView {
    /// Subject the view was resolved for.
    pub subject: String,
    /// Tenant the request targeted.
    pub tenant_id: Option<TenantId>,
    /// Role hint carried by the token. Diagnostic only, never used to decide.
    pub claimed_role: Option<String>,
    /// Role keys of the active assignments.
    pub roles: Vec<RoleKey>,
    /// Resolved capability set.
    pub capabilities: CapabilitySet,
    /// Tier that produced the capability set.
    pub capability_source: CapabilitySource,
    /// Field restrictions resolved during the request, keyed by resource.
    pub field_restrictions: BTreeMap<String, FieldRestrictions>,
}
