use async_trait::async_trait;
use pathkey_application::MembershipStore;
use pathkey_core::{AppError, AppResult};
use pathkey_domain::{Role, RoleId, UserId, UserRole, UserRoleId};

use super::{MembershipRow, PostgresAccessStore, RoleRow, map_write_error};

#[async_trait]
impl MembershipStore for PostgresAccessStore {
    async fn find_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<Option<UserRole>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, user_id, role_id, assigned_at
            FROM auth_user_roles
            WHERE user_id = $1 AND role_id = $2
            ORDER BY assigned_at
            LIMIT 1
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load membership: {error}")))?;

        Ok(row.map(MembershipRow::into_membership))
    }

    async fn save(&self, membership: UserRole) -> AppResult<UserRole> {
        let membership_id = membership.id.unwrap_or_else(UserRoleId::new);

        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            INSERT INTO auth_user_roles (id, user_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET user_id = EXCLUDED.user_id,
                    role_id = EXCLUDED.role_id
            RETURNING id, user_id, role_id, assigned_at
            "#,
        )
        .bind(membership_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(membership.role_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "failed to save membership"))?;

        Ok(row.into_membership())
    }

    async fn delete_pair(&self, user_id: UserId, role_id: RoleId) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_user_roles
            WHERE user_id = $1 AND role_id = $2
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete membership: {error}")))?;

        Ok(result.rows_affected())
    }

    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_user_roles
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete role memberships: {error}"))
        })?;

        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<UserRole>> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, user_id, role_id, assigned_at
            FROM auth_user_roles
            WHERE user_id = $1
            ORDER BY assigned_at
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list memberships: {error}")))?;

        Ok(rows.into_iter().map(MembershipRow::into_membership).collect())
    }

    async fn list_roles_for_user(&self, user_id: UserId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT DISTINCT roles.id, roles.name
            FROM auth_roles AS roles
            INNER JOIN auth_user_roles AS memberships
                ON memberships.role_id = roles.id
            WHERE memberships.user_id = $1
            ORDER BY roles.name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list user roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }
}
