use async_trait::async_trait;
use pathkey_core::AppResult;
use pathkey_domain::{
    PermissionAssignment, PermissionAssignmentId, PermissionId, PermissionPath, RoleId, SubjectRef,
};

/// Assignment row joined with the path of its linked permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAssignment {
    /// The assignment row.
    pub assignment: PermissionAssignment,
    /// Path of the permission the assignment is bound to.
    pub path: PermissionPath,
}

/// Store port for permission assignment rows.
#[async_trait]
pub trait AssignmentStore: Send + Sync {
    /// Finds the assignment binding a subject to an exact permission.
    async fn find_for_subject(
        &self,
        subject: SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Option<PermissionAssignment>>;

    /// Lists a subject's assignments whose permission path is in the set,
    /// ordered by path.
    async fn list_for_subject_in_paths(
        &self,
        subject: SubjectRef,
        paths: &[PermissionPath],
    ) -> AppResult<Vec<PathAssignment>>;

    /// Persists an assignment, assigning an identity when the row is new.
    async fn save(&self, assignment: PermissionAssignment) -> AppResult<PermissionAssignment>;

    /// Lists the identities of all role-scoped assignments.
    async fn list_role_scoped_ids(&self) -> AppResult<Vec<PermissionAssignmentId>>;

    /// Deletes the assignments with the given identities, returning the
    /// number of rows removed.
    async fn delete_by_ids(&self, ids: &[PermissionAssignmentId]) -> AppResult<u64>;

    /// Deletes every assignment scoped to the role, returning the number of
    /// rows removed.
    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64>;
}
