//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod capability;
mod module;
mod permission;
mod role;

pub use capability::{CapabilityCode, CapabilitySet, CapabilitySource};
pub use module::{ModuleActivation, ModuleDescriptor};
pub use permission::{Action, FieldRestrictions, FieldVisibility, PermissionGrant};
pub use role::{LegacyMembershipRole, RoleAssignment, RoleId, RoleKey};
