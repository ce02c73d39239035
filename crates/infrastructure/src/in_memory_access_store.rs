use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use pathkey_application::{
    AssignmentStore, MembershipStore, PathAssignment, PermissionStore, RoleStore, UserStore,
};
use pathkey_core::{AppError, AppResult};
use pathkey_domain::{
    Permission, PermissionAssignment, PermissionAssignmentId, PermissionId, PermissionPath, Role,
    RoleId, SubjectRef, User, UserId, UserRole, UserRoleId,
};
use tokio::sync::RwLock;

/// In-memory access-control store for tests and embedded use.
///
/// Identities are assigned on save; the natural keys (role name, permission
/// path) are kept unique the way the relational schema would.
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    roles: RwLock<HashMap<RoleId, Role>>,
    permissions: RwLock<HashMap<PermissionId, Permission>>,
    users: RwLock<HashMap<UserId, User>>,
    memberships: RwLock<HashMap<UserRoleId, UserRole>>,
    assignments: RwLock<HashMap<PermissionAssignmentId, PermissionAssignment>>,
}

impl InMemoryAccessStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of membership rows currently held.
    pub async fn membership_count(&self) -> usize {
        self.memberships.read().await.len()
    }

    /// Returns the number of assignment rows currently held.
    pub async fn assignment_count(&self) -> usize {
        self.assignments.read().await.len()
    }
}

#[async_trait]
impl RoleStore for InMemoryAccessStore {
    async fn find(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .read()
            .await
            .values()
            .find(|role| role.name.as_str() == name)
            .cloned())
    }

    async fn save(&self, mut role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;

        let duplicate = roles
            .values()
            .any(|stored| stored.name.as_str() == role.name.as_str() && stored.id != role.id);
        if duplicate {
            return Err(AppError::Conflict(format!(
                "role name '{}' already exists",
                role.name
            )));
        }

        let role_id = role.id.unwrap_or_else(RoleId::new);
        role.id = Some(role_id);
        roles.insert(role_id, role.clone());
        Ok(role)
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        self.roles.write().await.remove(&role_id);
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for InMemoryAccessStore {
    async fn find_by_path(&self, path: &PermissionPath) -> AppResult<Option<Permission>> {
        Ok(self
            .permissions
            .read()
            .await
            .values()
            .find(|permission| &permission.path == path)
            .cloned())
    }

    async fn save(&self, mut permission: Permission) -> AppResult<Permission> {
        let mut permissions = self.permissions.write().await;

        let duplicate = permissions
            .values()
            .any(|stored| stored.path == permission.path && stored.id != permission.id);
        if duplicate {
            return Err(AppError::Conflict(format!(
                "permission path '{}' already exists",
                permission.path
            )));
        }

        let permission_id = permission.id.unwrap_or_else(PermissionId::new);
        permission.id = Some(permission_id);
        permissions.insert(permission_id, permission.clone());
        Ok(permission)
    }
}

#[async_trait]
impl UserStore for InMemoryAccessStore {
    async fn find(&self, user_id: UserId) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&user_id).cloned())
    }

    async fn save(&self, mut user: User) -> AppResult<User> {
        let user_id = user.id.unwrap_or_else(UserId::new);
        user.id = Some(user_id);
        self.users.write().await.insert(user_id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl MembershipStore for InMemoryAccessStore {
    async fn find_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<Option<UserRole>> {
        Ok(self
            .memberships
            .read()
            .await
            .values()
            .find(|membership| membership.user_id == user_id && membership.role_id == role_id)
            .cloned())
    }

    async fn save(&self, mut membership: UserRole) -> AppResult<UserRole> {
        if membership.assigned_at.is_none() {
            membership.assigned_at = Some(Utc::now());
        }

        let membership_id = membership.id.unwrap_or_else(UserRoleId::new);
        membership.id = Some(membership_id);
        self.memberships
            .write()
            .await
            .insert(membership_id, membership.clone());
        Ok(membership)
    }

    async fn delete_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<u64> {
        let mut memberships = self.memberships.write().await;
        let before = memberships.len();
        memberships
            .retain(|_, membership| !(membership.user_id == user_id && membership.role_id == role_id));
        Ok((before - memberships.len()) as u64)
    }

    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut memberships = self.memberships.write().await;
        let before = memberships.len();
        memberships.retain(|_, membership| membership.role_id != role_id);
        Ok((before - memberships.len()) as u64)
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
        let mut listed: Vec<UserRole> = self
            .memberships
            .read()
            .await
            .values()
            .filter(|membership| membership.user_id == user_id)
            .cloned()
            .collect();
        listed.sort_by_key(|membership| membership.assigned_at);
        Ok(listed)
    }

    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let memberships = self.list_for_user(user_id).await?;
        let roles = self.roles.read().await;

        let mut listed: Vec<Role> = roles
            .values()
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
impl AssignmentStore for InMemoryAccessStore {
    async fn find_for_subject(
        &self,
        subject: SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Option<PermissionAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
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
        let permissions = self.permissions.read().await;

        let mut listed: Vec<PathAssignment> = self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| assignment.subject == subject)
            .filter_map(|assignment| {
                permissions
                    .get(&assignment.permission_id)
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
        let assignment_id = assignment.id.unwrap_or_else(PermissionAssignmentId::new);
        assignment.id = Some(assignment_id);
        self.assignments
            .write()
            .await
            .insert(assignment_id, assignment.clone());
        Ok(assignment)
    }

    async fn list_role_scoped_ids(&self) -> AppResult<Vec<PermissionAssignmentId>> {
        Ok(self
            .assignments
            .read()
            .await
            .values()
            .filter(|assignment| assignment.subject.is_role())
            .filter_map(|assignment| assignment.id)
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[PermissionAssignmentId]) -> AppResult<u64> {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|assignment_id, _| !ids.contains(assignment_id));
        Ok((before - assignments.len()) as u64)
    }

    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let mut assignments = self.assignments.write().await;
        let before = assignments.len();
        assignments.retain(|_, assignment| assignment.subject != SubjectRef::Role(role_id));
        Ok((before - assignments.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use pathkey_application::{
        AssignmentStore, MembershipStore, PermissionStore, RoleStore, UserStore,
    };
    use pathkey_core::NonEmptyString;
    use pathkey_domain::{
        Access, Permission, PermissionAssignment, PermissionPath, Role, RoleName, SubjectRef,
        User, UserRole,
    };

    use super::InMemoryAccessStore;

    fn role(name: &str) -> Role {
        Role::new(RoleName::new(name).unwrap_or_else(|_| unreachable!()))
    }

    fn permission(path: &str) -> Permission {
        Permission::new(PermissionPath::new(path).unwrap_or_else(|_| unreachable!()))
    }

    fn user(name: &str) -> User {
        User::new(NonEmptyString::new(name).unwrap_or_else(|_| unreachable!()))
    }

    #[tokio::test]
    async fn save_assigns_identity_and_find_by_name_matches() {
        let store = InMemoryAccessStore::new();

        let saved = RoleStore::save(&store, role("editors")).await;
        assert!(saved.is_ok());
        assert!(saved.unwrap_or_else(|_| unreachable!()).id.is_some());

        let found = store.find_by_name("editors").await;
        assert!(found.is_ok());
        assert!(found.unwrap_or_default().is_some());
    }

    #[tokio::test]
    async fn duplicate_role_name_is_a_conflict() {
        let store = InMemoryAccessStore::new();

        assert!(RoleStore::save(&store, role("editors")).await.is_ok());
        let duplicate = RoleStore::save(&store, role("editors")).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn duplicate_permission_path_is_a_conflict() {
        let store = InMemoryAccessStore::new();

        assert!(
            PermissionStore::save(&store, permission("Content/Edit"))
                .await
                .is_ok()
        );
        let duplicate = PermissionStore::save(&store, permission("Content/Edit")).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn membership_save_stamps_assignment_time() {
        let store = InMemoryAccessStore::new();

        let saved_user = UserStore::save(&store, user("bob")).await;
        assert!(saved_user.is_ok());
        let saved_role = RoleStore::save(&store, role("editors")).await;
        assert!(saved_role.is_ok());

        let user_id = saved_user
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();
        let role_id = saved_role
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();

        let membership = MembershipStore::save(&store, UserRole::new(user_id, role_id)).await;
        assert!(membership.is_ok());
        let membership = membership.unwrap_or_else(|_| unreachable!());
        assert!(membership.id.is_some());
        assert!(membership.assigned_at.is_some());

        let removed = store.delete_pair(user_id, role_id).await;
        assert!(removed.is_ok());
        assert_eq!(removed.unwrap_or_default(), 1);
        assert_eq!(store.membership_count().await, 0);
    }

    #[tokio::test]
    async fn saving_with_an_identity_updates_in_place() {
        let store = InMemoryAccessStore::new();

        let saved_role = RoleStore::save(&store, role("editors")).await;
        assert!(saved_role.is_ok());
        let role_id = saved_role
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();
        let saved_permission = PermissionStore::save(&store, permission("Content/Edit")).await;
        assert!(saved_permission.is_ok());
        let permission_id = saved_permission
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();

        let subject = SubjectRef::Role(role_id);
        let created = AssignmentStore::save(
            &store,
            PermissionAssignment::new(permission_id, subject, Access::Allowed),
        )
        .await;
        assert!(created.is_ok());
        let mut created = created.unwrap_or_else(|_| unreachable!());

        created.access = Access::Denied;
        let updated = AssignmentStore::save(&store, created).await;
        assert!(updated.is_ok());

        assert_eq!(store.assignment_count().await, 1);
        let found = store.find_for_subject(subject, permission_id).await;
        assert!(found.is_ok());
        let access = found
            .unwrap_or_default()
            .map(|assignment| assignment.access);
        assert_eq!(access, Some(Access::Denied));
    }

    #[tokio::test]
    async fn path_listing_filters_and_orders_by_path() {
        let store = InMemoryAccessStore::new();

        let saved_role = RoleStore::save(&store, role("editors")).await;
        assert!(saved_role.is_ok());
        let role_id = saved_role
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();
        let subject = SubjectRef::Role(role_id);

        for path in ["Content", "Content/Edit", "Reports"] {
            let saved = PermissionStore::save(&store, permission(path)).await;
            assert!(saved.is_ok());
            let permission_id = saved
                .unwrap_or_else(|_| unreachable!())
                .id
                .unwrap_or_default();
            let assignment = AssignmentStore::save(
                &store,
                PermissionAssignment::new(permission_id, subject, Access::Allowed),
            )
            .await;
            assert!(assignment.is_ok());
        }

        let chain = PermissionPath::new("Content/Edit")
            .unwrap_or_else(|_| unreachable!())
            .ancestors();
        let listed = store.list_for_subject_in_paths(subject, &chain).await;
        assert!(listed.is_ok());

        let paths: Vec<String> = listed
            .unwrap_or_default()
            .iter()
            .map(|matched| matched.path.as_str().to_owned())
            .collect();
        assert_eq!(paths, vec!["Content", "Content/Edit"]);
    }

    #[tokio::test]
    async fn role_scoped_rows_can_be_removed_together() {
        let store = InMemoryAccessStore::new();

        let saved_role = RoleStore::save(&store, role("editors")).await;
        assert!(saved_role.is_ok());
        let role_id = saved_role
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();
        let saved_user = UserStore::save(&store, user("bob")).await;
        assert!(saved_user.is_ok());
        let user_id = saved_user
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();

        let saved = PermissionStore::save(&store, permission("Content/Edit")).await;
        assert!(saved.is_ok());
        let permission_id = saved
            .unwrap_or_else(|_| unreachable!())
            .id
            .unwrap_or_default();

        let role_assignment = AssignmentStore::save(
            &store,
            PermissionAssignment::new(permission_id, SubjectRef::Role(role_id), Access::Allowed),
        )
        .await;
        assert!(role_assignment.is_ok());
        let user_assignment = AssignmentStore::save(
            &store,
            PermissionAssignment::new(permission_id, SubjectRef::User(user_id), Access::Allowed),
        )
        .await;
        assert!(user_assignment.is_ok());
        let membership = MembershipStore::save(&store, UserRole::new(user_id, role_id)).await;
        assert!(membership.is_ok());

        let removed_memberships = MembershipStore::delete_for_role(&store, role_id).await;
        assert!(removed_memberships.is_ok());
        let removed_assignments = AssignmentStore::delete_for_role(&store, role_id).await;
        assert!(removed_assignments.is_ok());
        assert_eq!(removed_assignments.unwrap_or_default(), 1);

        assert_eq!(store.membership_count().await, 0);
        assert_eq!(store.assignment_count().await, 1);
    }
}
