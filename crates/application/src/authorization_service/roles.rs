use std::collections::BTreeSet;

use tracing::debug;
use vigil_domain::{RoleAssignment, RoleKey};

use super::*;

impl AuthorizationScope {
    /// Returns the subject's currently effective role assignments.
    ///
    /// Expired, inactive and foreign-tenant assignments are dropped. Any store
    /// failure yields an empty set. Order carries no meaning.
    pub async fn active_roles(&self) -> &[RoleAssignment] {
        self.roles
            .get_or_init(|| self.resolve_active_roles())
            .await
            .as_slice()
    }

    /// Returns the distinct role keys of the active assignments.
    pub async fn active_role_keys(&self) -> BTreeSet<RoleKey> {
        self.active_roles()
            .await
            .iter()
            .map(|assignment| assignment.role_key().clone())
            .collect()
    }

    /// Returns whether the identity flag or an active role grants super-admin.
    pub async fn is_super_admin(&self) -> bool {
        if self.identity.is_super_admin() {
            return true;
        }

        self.active_roles()
            .await
            .iter()
            .any(|assignment| assignment.role_key().is_super_admin())
    }

    async fn resolve_active_roles(&self) -> Vec<RoleAssignment> {
        if !self.identity.is_authenticated() {
            return Vec::new();
        }

        let subject = self.identity.subject();
        let assignments = match self
            .call_store(
                "list_role_assignments_for_subject",
                self.repository()
                    .list_role_assignments_for_subject(subject, self.now),
            )
            .await
        {
            Ok(assignments) => assignments,
            Err(failure) => {
                self.log_fail_closed("list_role_assignments_for_subject", &failure);
                return Vec::new();
            }
        };

        if !assignments.is_empty() {
            return assignments
                .into_iter()
                .filter(|assignment| self.contributes(assignment))
                .collect();
        }

        // Adapters may drop expired or revoked rows, so ask whether any row
        // exists before trusting legacy memberships.
        match self
            .call_store(
                "has_role_assignments",
                self.repository().has_role_assignments(subject),
            )
            .await
        {
            Ok(false) => self.resolve_legacy_roles().await,
            Ok(true) => {
                debug!(
                    subject,
                    "subject has no effective role assignment, ignoring legacy memberships"
                );
                Vec::new()
            }
            Err(failure) => {
                self.log_fail_closed("has_role_assignments", &failure);
                Vec::new()
            }
        }
    }

    /// Maps coarse legacy membership values onto specific role keys.
    ///
    /// Only consulted for subjects that never received a fine-grained
    /// assignment.
    async fn resolve_legacy_roles(&self) -> Vec<RoleAssignment> {
        let subject = self.identity.subject();
        let memberships = match self
            .call_store(
                "list_legacy_memberships_for_subject",
                self.repository().list_legacy_memberships_for_subject(subject),
            )
            .await
        {
            Ok(memberships) => memberships,
            Err(failure) => {
                self.log_fail_closed("list_legacy_memberships_for_subject", &failure);
                return Vec::new();
            }
        };

        let mapped: Vec<(RoleKey, Option<vigil_core::TenantId>)> = memberships
            .iter()
            .filter_map(|membership| {
                let role_key = membership.mapped_role_key();
                if role_key.is_none() {
                    debug!(
                        subject,
                        legacy_role = %membership.role,
                        "ignoring unmapped legacy membership role"
                    );
                }
                role_key.map(|role_key| (role_key, membership.tenant_id))
            })
            .collect();

        if mapped.is_empty() {
            return Vec::new();
        }

        let role_keys: Vec<RoleKey> = mapped
            .iter()
            .map(|(role_key, _)| role_key.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let role_ids = match self
            .call_store("find_role_ids", self.repository().find_role_ids(&role_keys))
            .await
        {
            Ok(role_ids) => role_ids,
            Err(failure) => {
                self.log_fail_closed("find_role_ids", &failure);
                return Vec::new();
            }
        };

        mapped
            .into_iter()
            .filter_map(|(role_key, tenant_id)| {
                let role_id = role_ids
                    .iter()
                    .find_map(|(key, role_id)| (key == &role_key).then_some(*role_id))?;
                let assignment = RoleAssignment::new(subject, role_id, role_key);
                Some(match tenant_id {
                    Some(tenant_id) => assignment.with_tenant(tenant_id),
                    None => assignment,
                })
            })
            .filter(|assignment| self.contributes(assignment))
            .collect()
    }

    fn contributes(&self, assignment: &RoleAssignment) -> bool {
        assignment.subject() == self.identity.subject()
            && assignment.is_effective_at(self.now)
            && assignment.applies_to_tenant(self.identity.tenant_id())
    }
}
