use async_trait::async_trait;
use pathkey_core::AppResult;
use pathkey_domain::{Permission, PermissionPath, Role, RoleId, User, UserId};

/// Store port for role records.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Finds a role by identity.
    async fn find(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Finds a role by its unique name.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// Persists a role, assigning an identity when the record is new.
    async fn save(&self, role: Role) -> AppResult<Role>;

    /// Deletes a role record. Dependent membership and assignment rows are
    /// removed by the caller before this is invoked.
    async fn delete(&self, role_id: RoleId) -> AppResult<()>;
}

/// Store port for permission records.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Finds a permission by its unique path.
    async fn find_by_path(&self, path: &PermissionPath) -> AppResult<Option<Permission>>;

    /// Persists a permission, assigning an identity when the record is new.
    async fn save(&self, permission: Permission) -> AppResult<Permission>;
}

/// Store port for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by identity.
    async fn find(&self, user_id: UserId) -> AppResult<Option<User>>;

    /// Persists a user, assigning an identity when the record is new.
    async fn save(&self, user: User) -> AppResult<User>;
}
