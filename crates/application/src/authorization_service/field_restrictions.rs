use super::*;

impl AuthorizationScope {
    /// Returns the effective field visibility for `resource`.
    ///
    /// Levels are merged across every grant of every active role, keeping the
    /// most permissive one per field. Super-admins get an empty map. A store
    /// failure yields [`FieldRestrictions::deny_all`].
    pub async fn field_restrictions(&self, resource: &str) -> FieldRestrictions {
        if let Some(restrictions) = self.field_restrictions.lock().await.get(resource) {
            return restrictions.clone();
        }

        let restrictions = self.resolve_field_restrictions(resource).await;
        self.field_restrictions
            .lock()
            .await
            .insert(resource.to_owned(), restrictions.clone());
        restrictions
    }

    async fn resolve_field_restrictions(&self, resource: &str) -> FieldRestrictions {
        if self.is_super_admin().await {
            return FieldRestrictions::unrestricted();
        }

        let role_keys: Vec<RoleKey> = self.active_role_keys().await.into_iter().collect();
        if role_keys.is_empty() {
            return FieldRestrictions::unrestricted();
        }

        match self
            .call_store(
                "list_permissions_for_roles",
                self.repository()
                    .list_permissions_for_roles(&role_keys, resource, None),
            )
            .await
        {
            Ok(grants) => FieldRestrictions::from_grants(grants.iter().filter(|grant| {
                grant.is_active()
                    && grant.resource() == resource
                    && role_keys.contains(grant.role_key())
            })),
            Err(failure) => {
                self.log_fail_closed("list_permissions_for_roles", &failure);
                FieldRestrictions::deny_all()
            }
        }
    }
}
