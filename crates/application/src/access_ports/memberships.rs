use async_trait::async_trait;
use pathkey_core::AppResult;
use pathkey_domain::{Role, RoleId, UserId, UserRole};

/// Store port for user/role membership rows.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Finds one membership row for the pair, if any exists.
    async fn find_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<Option<UserRole>>;

    /// Persists a membership row, assigning an identity and timestamp when
    /// the row is new.
    async fn save(&self, membership: UserRole) -> AppResult<UserRole>;

    /// Deletes all membership rows for the pair, returning the number of
    /// rows removed.
    async fn delete_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<u64>;

    /// Deletes every membership row for the role, returning the number of
    /// rows removed.
    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64>;

    /// Lists a user's membership rows.
    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>>;

    /// Lists the roles a user belongs to through membership rows, ordered by
    /// role name.
    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>>;
}
