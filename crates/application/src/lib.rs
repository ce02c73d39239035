//! Application services and store ports for pathkey access control.

#![forbid(unsafe_code)]

mod access_gate;
mod access_ports;
mod permission_service;
mod reconciliation_service;
#[cfg(test)]
mod test_support;
mod user_access_service;

pub use access_gate::AccessGate;
pub use access_ports::{
    AssignmentStore, CurrentUserProvider, MembershipStore, PathAssignment, PermissionStore,
    RoleStore, UserStore,
};
pub use permission_service::PermissionService;
pub use reconciliation_service::{ReconciliationService, ReconciliationSummary};
pub use user_access_service::UserAccessService;
