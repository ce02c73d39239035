use async_trait::async_trait;
use pathkey_application::{PermissionStore, RoleStore, UserStore};
use pathkey_core::{AppError, AppResult};
use pathkey_domain::{Permission, PermissionId, PermissionPath, Role, RoleId, User, UserId};

use super::{PermissionRow, PostgresAccessStore, RoleRow, UserRow, map_write_error};

#[async_trait]
impl RoleStore for PostgresAccessStore {
    async fn find(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM auth_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM auth_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role by name: {error}")))?;

        row.map(RoleRow::into_role).transpose()
    }

    async fn save(&self, mut role: Role) -> AppResult<Role> {
        let role_id = role.id.unwrap_or_else(RoleId::new);
        role.id = Some(role_id);

        sqlx::query(
            r#"
            INSERT INTO auth_roles (id, name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(role.name.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "failed to save role"))?;

        Ok(role)
    }

    async fn delete(&self, role_id: RoleId) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM auth_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        Ok(())
    }
}

#[async_trait]
impl PermissionStore for PostgresAccessStore {
    async fn find_by_path(&self, path: &PermissionPath) -> AppResult<Option<Permission>> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, path, name
            FROM auth_permissions
            WHERE path = $1
            "#,
        )
        .bind(path.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load permission by path: {error}"))
        })?;

        row.map(PermissionRow::into_permission).transpose()
    }

    async fn save(&self, mut permission: Permission) -> AppResult<Permission> {
        let permission_id = permission.id.unwrap_or_else(PermissionId::new);
        permission.id = Some(permission_id);

        sqlx::query(
            r#"
            INSERT INTO auth_permissions (id, path, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET path = EXCLUDED.path, name = EXCLUDED.name
            "#,
        )
        .bind(permission_id.as_uuid())
        .bind(permission.path.as_str())
        .bind(permission.name.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "failed to save permission"))?;

        Ok(permission)
    }
}

#[async_trait]
impl UserStore for PostgresAccessStore {
    async fn find(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, primary_role_id
            FROM auth_users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user: {error}")))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn save(&self, mut user: User) -> AppResult<User> {
        let user_id = user.id.unwrap_or_else(UserId::new);
        user.id = Some(user_id);

        sqlx::query(
            r#"
            INSERT INTO auth_users (id, username, primary_role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET username = EXCLUDED.username,
                    primary_role_id = EXCLUDED.primary_role_id
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(user.username.as_str())
        .bind(user.primary_role_id.map(|role_id| role_id.as_uuid()))
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "failed to save user"))?;

        Ok(user)
    }
}
