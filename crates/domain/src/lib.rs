//! Domain types for pathkey access control.

#![forbid(unsafe_code)]

mod definitions;
mod ids;
mod path;
mod permission;
mod role;
mod user;

pub use definitions::RolePermissionDefinitions;
pub use ids::{PermissionAssignmentId, PermissionId, RoleId, UserId, UserRoleId};
pub use path::PermissionPath;
pub use permission::{Access, Permissible, Permission, PermissionAssignment, SubjectRef};
pub use role::{Role, RoleName, UserRole};
pub use user::User;
