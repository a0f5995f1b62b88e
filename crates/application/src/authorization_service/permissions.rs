use super::*;

impl AuthorizationScope {
    /// Returns whether the subject may perform `action` on `resource`.
    ///
    /// Matching is exact on both resource and action. A store failure is a
    /// denial.
    pub async fn has_permission(&self, resource: &str, action: Action) -> bool {
        if self.identity.is_super_admin() {
            return true;
        }

        let key = (resource.to_owned(), action);
        if let Some(decision) = self.permission_decisions.lock().await.get(&key) {
            return *decision;
        }

        let decision = self.resolve_permission(resource, action).await;
        self.permission_decisions.lock().await.insert(key, decision);
        decision
    }

    /// Ensures the subject may perform `action` on `resource`.
    pub async fn require_permission(&self, resource: &str, action: Action) -> AppResult<()> {
        if self.has_permission(resource, action).await {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{}' is missing permission '{}' on '{resource}'",
            self.identity.subject(),
            action.as_str()
        )))
    }

    async fn resolve_permission(&self, resource: &str, action: Action) -> bool {
        let role_keys = self.active_role_keys().await;
        if role_keys.is_empty() {
            return false;
        }

        if role_keys.iter().any(RoleKey::is_super_admin) {
            return true;
        }

        let role_keys: Vec<RoleKey> = role_keys.into_iter().collect();
        let grants = match self
            .call_store(
                "list_permissions_for_roles",
                self.repository()
                    .list_permissions_for_roles(&role_keys, resource, Some(action)),
            )
            .await
        {
            Ok(grants) => grants,
            Err(failure) => {
                self.log_fail_closed("list_permissions_for_roles", &failure);
                return false;
            }
        };

        grants
            .iter()
            .any(|grant| grant.allows(resource, action) && role_keys.contains(grant.role_key()))
    }
}
