//! Shared in-memory fake store for service tests.

use async_trait::async_trait;
use pathkey_core::{AppError, AppResult};
use pathkey_domain::{
    Permission, PermissionAssignment, PermissionAssignmentId, PermissionId, PermissionPath, Role,
    RoleId, SubjectRef, User, UserId, UserRole, UserRoleId,
};
use tokio::sync::Mutex;

use crate::{
    AssignmentStore, MembershipStore, PathAssignment, PermissionStore, RoleStore, UserStore,
};

/// Vec-backed fake implementing every store port.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) roles: Mutex<Vec<Role>>,
    pub(crate) permissions: Mutex<Vec<Permission>>,
    pub(crate) users: Mutex<Vec<User>>,
    pub(crate) memberships: Mutex<Vec<UserRole>>,
    pub(crate) assignments: Mutex<Vec<PermissionAssignment>>,
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn find(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id == Some(role_id))
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name.as_str() == name)
            .cloned())
    }

    async fn save(&self, mut role: Role) -> AppResult<Role> {
        let mut roles = self.roles.lock().await;
        match role.id {
            Some(role_id) => {
                let Some(stored) = roles.iter_mut().find(|stored| stored.id == Some(role_id))
                else {
                    return Err(AppError::NotFound(format!(
                        "role '{role_id}' does not exist"
                    )));
                };
                *stored = role.clone();
            }
            None => {
                role.id = Some(RoleId::new());
                roles.push(role.clone());
            }
        }
        Ok(role)
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        self.roles.lock().await.retain(|role| role.id != Some(role_id));
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryStore {
    async fn find_by_path(&self, path: &PermissionPath) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .lock()
            .await
            .iter()
            .find(|permission| &permission.path == path)
            .cloned())
    }

    async fn save(&self, mut permission: Permission) -> AppResult<Permission> {
        let mut permissions = self.permissions.lock().await;
        match permission.id {
            Some(permission_id) => {
                let Some(stored) = permissions
                    .iter_mut()
                    .find(|stored| stored.id == Some(permission_id))
                else {
                    return Err(AppError::NotFound(format!(
                        "permission '{permission_id}' does not exist"
                    )));
                };
                *stored = permission.clone();
            }
            None => {
                permission.id = Some(PermissionId::new());
                permissions.push(permission.clone());
            }
        }
        Ok(permission)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.id == Some(user_id))
            .cloned())
    }

    async fn save(&self, mut user: User) -> AppResult<User> {
        let mut users = self.users.lock().await;
        match user.id {
            Some(user_id) => {
                let Some(stored) = users.iter_mut().find(|stored| stored.id == Some(user_id))
                else {
                    return Err(AppError::NotFound(format!(
                        "user '{user_id}' does not exist"
                    )));
                };
                *stored = user.clone();
            }
            None => {
                user.id = Some(UserId::new());
                users.push(user.clone());
            }
        }
        Ok(user)
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn find_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<Option<UserRole>> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .find(|membership| membership.user_id == user_id && membership.role_id == role_id)
            .cloned())
    }

    async fn save(&self, mut membership: UserRole) -> AppResult<UserRole> {
        let mut memberships = self.memberships.lock().await;
        if membership.id.is_none() {
            membership.id = Some(UserRoleId::new());
            memberships.push(membership.clone());
        }
        Ok(membership)
    }

    async fn delete_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<u64> {
        let mut memberships = self.memberships.lock().await;
        let before = memberships.len();
        memberships
            .retain(|membership| !(membership.user_id == user_id && membership.role_id == role_id));
        Ok((before - memberships.len()) as u64)
    }

    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut memberships = self.memberships.lock().await;
        let before = memberships.len();
        memberships.retain(|membership| membership.role_id != role_id);
        Ok((before - memberships.len()) as u64)
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
        Ok(self
            .memberships
            .lock()
            .await
            .iter()
            .filter(|membership| membership.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let memberships = self.list_for_user(user_id).await?;
        let roles = self.roles.lock().await;
        let mut listed: Vec<Role> = roles
            .iter()
            .filter(|role| {
                memberships
                    .iter()
                    .any(|membership| role.id == Some(membership.role_id))
            })
            .cloned()
            .collect();
        listed.sort_by(|left, right| left.name.as_str().cmp(right.name.as_str()));
        Ok(listed)
    }
}

#[async_trait]
impl AssignmentStore for MemoryStore {
    async fn find_for_subject(
        &self,
        subject: SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Option<PermissionAssignment>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .find(|assignment| {
                assignment.subject == subject && assignment.permission_id == permission_id
            })
            .cloned())
    }

    async fn list_for_subject_in_paths(
        &self,
        subject: SubjectRef,
        paths: &[PermissionPath],
    ) -> AppResult<Vec<PathAssignment>> {
        let permissions = self.permissions.lock().await;
        let mut listed: Vec<PathAssignment> = self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.subject == subject)
            .filter_map(|assignment| {
                permissions
                    .iter()
                    .find(|permission| permission.id == Some(assignment.permission_id))
                    .filter(|permission| paths.contains(&permission.path))
                    .map(|permission| PathAssignment {
                        assignment: assignment.clone(),
                        path: permission.path.clone(),
                    })
            })
            .collect();
        listed.sort_by(|left, right| left.path.cmp(&right.path));
        Ok(listed)
    }

    async fn save(&self, mut assignment: PermissionAssignment) -> AppResult<PermissionAssignment> {
        let mut assignments = self.assignments.lock().await;
        match assignment.id {
            Some(assignment_id) => {
                let Some(stored) = assignments
                    .iter_mut()
                    .find(|stored| stored.id == Some(assignment_id))
                else {
                    return Err(AppError::NotFound(format!(
                        "assignment '{assignment_id}' does not exist"
                    )));
                };
                *stored = assignment.clone();
            }
            None => {
                assignment.id = Some(PermissionAssignmentId::new());
                assignments.push(assignment.clone());
            }
        }
        Ok(assignment)
    }

    async fn list_role_scoped_ids(&self) -> AppResult<Vec<PermissionAssignmentId>> {
        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.subject.is_role())
            .filter_map(|assignment| assignment.id)
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[PermissionAssignmentId]) -> AppResult<u64> {
        let mut assignments = self.assignments.lock().await;
        let before = assignments.len();
        assignments.retain(|assignment| {
            assignment
                .id
                .map(|assignment_id| !ids.contains(&assignment_id))
                .unwrap_or(true)
        });
        Ok((before - assignments.len()) as u64)
    }

    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut assignments = self.assignments.lock().await;
        let before = assignments.len();
        assignments.retain(|assignment| assignment.subject != SubjectRef::Role(role_id));
        Ok((before - assignments.len()) as u64)
    }
}
