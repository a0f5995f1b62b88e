use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vigil_core::{AppError, AppResult, NonEmptyString};

use crate::RoleKey;

/// Operation a permission grant allows on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create records.
    Create,
    /// Read records.
    Read,
    /// Update records.
    Update,
    /// Delete records.
    Delete,
    /// Export records out of the platform.
    Export,
    /// Hand one's own access to another subject.
    Delegate,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Delegate => "delegate",
        }
    }

    /// Returns all known actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Export,
            Action::Delegate,
        ];

        ALL
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "create" => Ok(Self::Create),
            "read" => Ok(Self::Read),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export),
            "delegate" => Ok(Self::Delegate),
            _ => Err(AppError::Validation(format!(
                "unknown action value '{value}'"
            ))),
        }
    }
}

impl Display for Action {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Visibility of one field of a resource.
///
/// Variants are declared from most to least restrictive so that `Ord`
/// ranks privilege: `Hidden < Masked < Visible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldVisibility {
    /// Field is removed from responses.
    Hidden,
    /// Field is present but redacted.
    Masked,
    /// Field is returned as stored.
    Visible,
}

impl FieldVisibility {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Masked => "masked",
            Self::Visible => "visible",
        }
    }

    /// Returns the more permissive of two levels.
    #[must_use]
    pub fn most_permissive(self, other: Self) -> Self {
        self.max(other)
    }
}

impl FromStr for FieldVisibility {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hidden" => Ok(Self::Hidden),
            "masked" => Ok(Self::Masked),
            "visible" => Ok(Self::Visible),
            _ => Err(AppError::Validation(format!(
                "unknown field visibility value '{value}'"
            ))),
        }
    }
}

/// A (resource, action) pair granted to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    role_key: RoleKey,
    resource: NonEmptyString,
    action: Action,
    field_restrictions: BTreeMap<String, FieldVisibility>,
    is_active: bool,
}

impl PermissionGrant {
    /// Creates an active grant without field restrictions.
    pub fn new(role_key: RoleKey, resource: impl Into<String>, action: Action) -> AppResult<Self> {
        Ok(Self {
            role_key,
            resource: NonEmptyString::new(resource)?,
            action,
            field_restrictions: BTreeMap::new(),
            is_active: true,
        })
    }

    /// Adds or replaces one field restriction.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>, visibility: FieldVisibility) -> Self {
        self.field_restrictions.insert(field.into(), visibility);
        self
    }

    /// Replaces every field restriction.
    #[must_use]
    pub fn with_field_restrictions(
        mut self,
        field_restrictions: BTreeMap<String, FieldVisibility>,
    ) -> Self {
        self.field_restrictions = field_restrictions;
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the role the grant is bound to.
    #[must_use]
    pub fn role_key(&self) -> &RoleKey {
        &self.role_key
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the granted action.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns the per-field restriction map.
    #[must_use]
    pub fn field_restrictions(&self) -> &BTreeMap<String, FieldVisibility> {
        &self.field_restrictions
    }

    /// Returns whether the grant participates in resolution.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the grant allows exactly this resource and action.
    #[must_use]
    pub fn allows(&self, resource: &str, action: Action) -> bool {
        self.is_active && self.action == action && self.resource.as_str() == resource
    }
}

/// Effective field visibility for one subject and resource.
///
/// An empty map means no field is restricted. Fields missing from the map
/// are visible unless the value was produced by a fail-closed fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRestrictions {
    fields: BTreeMap<String, FieldVisibility>,
    deny_all: bool,
}

impl FieldRestrictions {
    /// Returns restrictions that leave every field visible.
    #[must_use]
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Returns restrictions that hide every field.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            fields: BTreeMap::new(),
            deny_all: true,
        }
    }

    /// Merges one restriction map, keeping the most permissive level per field.
    pub fn merge(&mut self, restrictions: &BTreeMap<String, FieldVisibility>) {
        for (field, visibility) in restrictions {
            self.fields
                .entry(field.clone())
                .and_modify(|current| *current = current.most_permissive(*visibility))
                .or_insert(*visibility);
        }
    }

    /// Builds merged restrictions from every grant's restriction map.
    #[must_use]
    pub fn from_grants<'a>(grants: impl IntoIterator<Item = &'a PermissionGrant>) -> Self {
        let mut restrictions = Self::unrestricted();
        for grant in grants {
            restrictions.merge(grant.field_restrictions());
        }
        restrictions
    }

    /// Returns the effective level for a field.
    #[must_use]
    pub fn level(&self, field: &str) -> FieldVisibility {
        if self.deny_all {
            return FieldVisibility::Hidden;
        }

        self.fields
            .get(field)
            .copied()
            .unwrap_or(FieldVisibility::Visible)
    }

    /// Returns whether no field is restricted.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        !self.deny_all && self.fields.is_empty()
    }

    /// Returns whether this value came from a fail-closed fallback.
    #[must_use]
    pub fn is_deny_all(&self) -> bool {
        self.deny_all
    }

    /// Returns the explicit per-field levels.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, FieldVisibility> {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use proptest::prelude::*;

    use super::{Action, FieldRestrictions, FieldVisibility, PermissionGrant};
    use crate::RoleKey;

    fn visibility() -> impl Strategy<Value = FieldVisibility> {
        prop_oneof![
            Just(FieldVisibility::Hidden),
            Just(FieldVisibility::Masked),
            Just(FieldVisibility::Visible),
        ]
    }

    fn restriction_map() -> impl Strategy<Value = BTreeMap<String, FieldVisibility>> {
        proptest::collection::btree_map("(cnp|salary|address|phone)", visibility(), 0..4)
    }

    #[test]
    fn action_roundtrip_storage_value() {
        for action in Action::all() {
            assert_eq!(Action::from_str(action.as_str()).ok(), Some(*action));
        }
        assert!(Action::from_str("approve").is_err());
    }

    #[test]
    fn visible_beats_hidden_in_either_order() {
        let visible = BTreeMap::from([("cnp".to_owned(), FieldVisibility::Visible)]);
        let hidden = BTreeMap::from([("cnp".to_owned(), FieldVisibility::Hidden)]);

        let mut first = FieldRestrictions::unrestricted();
        first.merge(&visible);
        first.merge(&hidden);

        let mut second = FieldRestrictions::unrestricted();
        second.merge(&hidden);
        second.merge(&visible);

        assert_eq!(first.level("cnp"), FieldVisibility::Visible);
        assert_eq!(first, second);
    }

    #[test]
    fn masked_beats_hidden_without_visible_grant() {
        let grants = [
            PermissionGrant::new(RoleKey::Angajat, "employees", Action::Read)
                .map(|grant| grant.with_field("salary", FieldVisibility::Hidden)),
            PermissionGrant::new(RoleKey::Inspector, "employees", Action::Read)
                .map(|grant| grant.with_field("salary", FieldVisibility::Masked)),
        ];
        let grants: Vec<PermissionGrant> = grants.into_iter().flatten().collect();

        let restrictions = FieldRestrictions::from_grants(&grants);
        assert_eq!(restrictions.level("salary"), FieldVisibility::Masked);
        assert_eq!(restrictions.level("name"), FieldVisibility::Visible);
    }

    #[test]
    fn deny_all_hides_every_field() {
        let restrictions = FieldRestrictions::deny_all();
        assert_eq!(restrictions.level("name"), FieldVisibility::Hidden);
        assert!(!restrictions.is_unrestricted());
    }

    #[test]
    fn inactive_grant_never_allows() {
        let grant = PermissionGrant::new(RoleKey::Viewer, "employees", Action::Read)
            .map(|grant| grant.with_active(false));
        assert!(grant.is_ok_and(|grant| !grant.allows("employees", Action::Read)));
    }

    proptest! {
        #[test]
        fn merge_is_commutative(left in restriction_map(), right in restriction_map()) {
            let mut forward = FieldRestrictions::unrestricted();
            forward.merge(&left);
            forward.merge(&right);

            let mut backward = FieldRestrictions::unrestricted();
            backward.merge(&right);
            backward.merge(&left);

            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn merge_is_idempotent(map in restriction_map()) {
            let mut once = FieldRestrictions::unrestricted();
            once.merge(&map);

            let mut twice = once.clone();
            twice.merge(&map);

            prop_assert_eq!(once, twice);
        }
    }
}
