use std::sync::Arc;

use pathkey_core::{AppError, AppResult};
use pathkey_domain::{
    Access, Permissible, Permission, PermissionAssignment, PermissionAssignmentId, PermissionPath,
    SubjectRef,
};

use crate::AssignmentStore;

/// Resolves and mutates permission assignments for a single subject.
#[derive(Clone)]
pub struct PermissionService {
    assignments: Arc<dyn AssignmentStore>,
}

impl PermissionService {
    /// Creates a new service from an assignment store implementation.
    #[must_use]
    pub fn new(assignments: Arc<dyn AssignmentStore>) -> Self {
        Self { assignments }
    }

    /// Decides whether the subject may act on the permission path.
    ///
    /// The most specific assignment along the path's ancestor chain wins;
    /// absence of any assignment is a denial.
    pub async fn can(&self, subject: SubjectRef, path: &str) -> AppResult<bool> {
        let path = PermissionPath::new(path)?;
        let chain = path.ancestors();

        let matches = self
            .assignments
            .list_for_subject_in_paths(subject, &chain)
            .await?;

        Ok(matches
            .into_iter()
            .max_by_key(|matched| matched.path.specificity())
            .map(|matched| matched.assignment.access.is_allowed())
            .unwrap_or(false))
    }

    /// Grants the permission to the subject.
    ///
    /// Upserts the single assignment for the `(subject, permission)` pair
    /// and returns its identity.
    pub async fn allow(
        &self,
        subject: &impl Permissible,
        permission: &Permission,
    ) -> AppResult<PermissionAssignmentId> {
        self.set_access(subject, permission, Access::Allowed).await
    }

    /// Denies the permission to the subject.
    ///
    /// Upserts the single assignment for the `(subject, permission)` pair
    /// and returns its identity.
    pub async fn deny(
        &self,
        subject: &impl Permissible,
        permission: &Permission,
    ) -> AppResult<PermissionAssignmentId> {
        self.set_access(subject, permission, Access::Denied).await
    }

    async fn set_access(
        &self,
        subject: &impl Permissible,
        permission: &Permission,
        access: Access,
    ) -> AppResult<PermissionAssignmentId> {
        let Some(permission_id) = permission.id else {
            return Err(AppError::UnsavedPermission(format!(
                "permission '{}' has no persisted identity",
                permission.path
            )));
        };

        let Some(subject_ref) = subject.saved_subject() else {
            return Err(AppError::UnsavedSubject(
                "subject has no persisted identity".to_owned(),
            ));
        };

        let assignment = match self
            .assignments
            .find_for_subject(subject_ref, permission_id)
            .await?
        {
            Some(mut existing) => {
                existing.access = access;
                existing
            }
            None => PermissionAssignment::new(permission_id, subject_ref, access),
        };

        let saved = self.assignments.save(assignment).await?;
        saved.id.ok_or_else(|| {
            AppError::Internal("assignment store returned an unsaved row from save".to_owned())
        })
    }
}
