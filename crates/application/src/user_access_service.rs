use std::sync::Arc;

use pathkey_core::{AppError, AppResult};
use pathkey_domain::{Role, RoleId, SubjectRef, User, UserId, UserRole};

use crate::{AssignmentStore, MembershipStore, PermissionService, RoleStore};

/// User-level access checks combining direct grants with role aggregation,
/// plus role membership management.
#[derive(Clone)]
pub struct UserAccessService {
    permissions: PermissionService,
    memberships: Arc<dyn MembershipStore>,
    roles: Arc<dyn RoleStore>,
    assignments: Arc<dyn AssignmentStore>,
}

impl UserAccessService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        permissions: PermissionService,
        memberships: Arc<dyn MembershipStore>,
        roles: Arc<dyn RoleStore>,
        assignments: Arc<dyn AssignmentStore>,
    ) -> Self {
        Self {
            permissions,
            memberships,
            roles,
            assignments,
        }
    }

    /// Decides whether the user may act on the permission path.
    ///
    /// Checks the user's own assignments, then the primary role, then each
    /// secondary role, short-circuiting on the first check that allows.
    /// A check that resolves to a denial does not block the remaining
    /// checks: a role-level allow overrides a direct user-level deny.
    pub async fn can(&self, user: &User, path: &str) -> AppResult<bool> {
        if let Some(user_id) = user.id
            && self.permissions.can(SubjectRef::User(user_id), path).await?
        {
            return Ok(true);
        }

        if let Some(role_id) = user.primary_role_id
            && self.permissions.can(SubjectRef::Role(role_id), path).await?
        {
            return Ok(true);
        }

        if let Some(user_id) = user.id {
            for membership in self.memberships.list_for_user(user_id).await? {
                if self
                    .permissions
                    .can(SubjectRef::Role(membership.role_id), path)
                    .await?
                {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Adds the user to a secondary role.
    ///
    /// Idempotent: when a membership row for the pair already exists, no
    /// second row is created.
    pub async fn add_to_role(&self, user: &User, role: &Role) -> AppResult<()> {
        let (user_id, role_id) = saved_pair(user, role)?;

        if self.memberships.find_pair(user_id, role_id).await?.is_none() {
            self.memberships
                .save(UserRole::new(user_id, role_id))
                .await?;
        }

        Ok(())
    }

    /// Removes the user from a secondary role.
    ///
    /// Deletes every membership row for the pair, so accidental duplicates
    /// are cleared as well.
    pub async fn remove_from_role(&self, user: &User, role: &Role) -> AppResult<()> {
        let (user_id, role_id) = saved_pair(user, role)?;
        self.memberships.delete_pair(user_id, role_id).await?;
        Ok(())
    }

    /// Returns whether the user holds a role with the given name, either as
    /// the primary role or through a secondary membership.
    pub async fn has_role(&self, user: &User, name: &str) -> AppResult<bool> {
        if let Some(role_id) = user.primary_role_id
            && let Some(role) = self.roles.find(role_id).await?
            && role.name.as_str() == name
        {
            return Ok(true);
        }

        if let Some(user_id) = user.id {
            for role in self.memberships.list_roles_for_user(user_id).await? {
                if role.name.as_str() == name {
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    /// Deletes a role together with its membership rows and role-scoped
    /// permission assignments.
    pub async fn delete_role(&self, role: &Role) -> AppResult<()> {
        let Some(role_id) = role.id else {
            return Err(AppError::UnsavedSubject(format!(
                "role '{}' has no persisted identity",
                role.name
            )));
        };

        self.memberships.delete_for_role(role_id).await?;
        self.assignments.delete_for_role(role_id).await?;
        self.roles.delete(role_id).await
    }
}

fn saved_pair(user: &User, role: &Role) -> AppResult<(UserId, RoleId)> {
    let Some(user_id) = user.id else {
        return Err(AppError::UnsavedSubject(format!(
            "user '{}' has no persisted identity",
            user.username
        )));
    };

    let Some(role_id) = role.id else {
        return Err(AppError::UnsavedSubject(format!(
            "role '{}' has no persisted identity",
            role.name
        )));
    };

    Ok((user_id, role_id))
}
