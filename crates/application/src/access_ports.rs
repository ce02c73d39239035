//! Store and session ports consumed by the access-control services.

mod assignments;
mod current_user;
mod directory;
mod memberships;

pub use assignments::{AssignmentStore, PathAssignment};
pub use current_user::CurrentUserProvider;
pub use directory::{PermissionStore, RoleStore, UserStore};
pub use memberships::MembershipStore;
