use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use pathkey_core::AppResult;
use pathkey_domain::{
    Access, Permission, PermissionAssignmentId, PermissionPath, Role, RoleName,
    RolePermissionDefinitions,
};

use crate::{AssignmentStore, PermissionService, PermissionStore, RoleStore};


/// Summary of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    /// Roles created because no record matched a definition name.
    pub roles_created: usize,
    /// Permissions created because no record matched a definition path.
    pub permissions_created: usize,
    /// Assignments written or confirmed by this run.
    pub assignments_retained: usize,
    /// Role-scoped assignments deleted because no definition regenerated
    /// them.
    pub assignments_pruned: u64,
}

#[derive(Default)]
struct RunState {
    roles: HashMap<String, Role>,
    permissions: HashMap<String, Permission>,
    keep: HashSet<PermissionAssignmentId>,
    summary: ReconciliationSummary,
}

/// Converges persisted role/permission assignment records onto a declarative
/// definitions value.
#[derive(Clone)]
pub struct ReconciliationService {
    permissions: PermissionService,
    roles: Arc<dyn RoleStore>,
    permission_store: Arc<dyn PermissionStore>,
    assignments: Arc<dyn AssignmentStore>,
}

impl ReconciliationService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permissions: PermissionService,
        roles: Arc<dyn RoleStore>,
        permission_store: Arc<dyn PermissionStore>,
        assignments: Arc<dyn AssignmentStore>,
    ) -> Self {
        Self {
            permissions,
            roles,
            permission_store,
            assignments,
        }
    }

    /// Makes the persisted role-scoped assignments match the definitions.
    ///
    /// Processes the allow map, then the deny map: each role and permission
    /// is found or created by its natural key, and the `(role, permission)`
    /// assignment is upserted with the map's access value. Afterwards every
    /// role-scoped assignment that no definition regenerated is deleted.
    /// User-scoped assignments are never pruned, and the pruning step is
    /// skipped entirely when the definitions produced no assignments.
    ///
    /// Running twice with unchanged definitions leaves the records
    /// unchanged. A store failure aborts the remaining steps; the records
    /// may then be partially converged and a later run completes the
    /// convergence.
    pub async fn reconcile(
        &self,
        definitions: &RolePermissionDefinitions,
    ) -> AppResult<ReconciliationSummary> {
        let mut state = RunState::default();

        self.apply(definitions.allow(), Access::Allowed, &mut state)
            .await?;
        self.apply(definitions.deny(), Access::Denied, &mut state)
            .await?;

        if !state.keep.is_empty() {
            let stale: Vec<PermissionAssignmentId> = self
                .assignments
                .list_role_scoped_ids()
                .await?
                .into_iter()
                .filter(|assignment_id| !state.keep.contains(assignment_id))
                .collect();

            if !stale.is_empty() {
                state.summary.assignments_pruned =
                    self.assignments.delete_by_ids(&stale).await?;
            }
        }

        state.summary.assignments_retained = state.keep.len();
        Ok(state.summary)
    }

    async fn apply(
        &self,
        rules: &BTreeMap<String, Vec<String>>,
        access: Access,
        state: &mut RunState,
    ) -> AppResult<()> {
        for (role_name, paths) in rules {
            let role = self.role_for(role_name, state).await?;

            for path in paths {
                let permission = self.permission_for(path, state).await?;
                let assignment_id = match access {
                    Access::Allowed => self.permissions.allow(&role, &permission).await?,
                    Access::Denied => self.permissions.deny(&role, &permission).await?,
                };
                state.keep.insert(assignment_id);
            }
        }

        Ok(())
    }

    async fn role_for(&self, name: &str, state: &mut RunState) -> AppResult<Role> {
        if let Some(cached) = state.roles.get(name) {
            return Ok(cached.clone());
        }

        let role = match self.roles.find_by_name(name).await? {
            Some(existing) => existing,
            None => {
                state.summary.roles_created += 1;
                self.roles.save(Role::new(RoleName::new(name)?)).await?
            }
        };

        state.roles.insert(name.to_owned(), role.clone());
        Ok(role)
    }

    async fn permission_for(&self, path: &str, state: &mut RunState) -> AppResult<Permission> {
        if let Some(cached) = state.permissions.get(path) {
            return Ok(cached.clone());
        }

        let normalized = PermissionPath::new(path)?;
        let permission = match self.permission_store.find_by_path(&normalized).await? {
            Some(existing) => existing,
            None => {
                state.summary.permissions_created += 1;
                self.permission_store
                    .save(Permission::new(normalized))
                    .await?
            }
        };

        state.permissions.insert(path.to_owned(), permission.clone());
        Ok(permission)
    }
}
