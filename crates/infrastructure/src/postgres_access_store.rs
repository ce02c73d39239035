use chrono::{DateTime, Utc};
use pathkey_core::{AppError, AppResult};
use pathkey_domain::{
    Access, Permission, PermissionAssignment, PermissionAssignmentId, PermissionId,
    PermissionPath, Role, RoleId, RoleName, SubjectRef, User, UserId, UserRole, UserRoleId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

mod assignments;
mod directory;
mod memberships;

/// PostgreSQL-backed store implementing every access-control port.
#[derive(Clone)]
pub struct PostgresAccessStore {
    pool: PgPool,
}

impl PostgresAccessStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let name = RoleName::new(self.name)
            .map_err(|error| AppError::Internal(format!("invalid role name in storage: {error}")))?;
        Ok(Role {
            id: Some(RoleId::from_uuid(self.id)),
            name,
        })
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    id: Uuid,
    path: String,
    name: String,
}

impl PermissionRow {
    fn into_permission(self) -> AppResult<Permission> {
        let path = PermissionPath::new(self.path).map_err(|error| {
            AppError::Internal(format!("invalid permission path in storage: {error}"))
        })?;
        Ok(Permission {
            id: Some(PermissionId::from_uuid(self.id)),
            path,
            name: self.name,
        })
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    primary_role_id: Option<Uuid>,
}

impl UserRow {
    fn into_user(self) -> AppResult<User> {
        let username = pathkey_core::NonEmptyString::new(self.username)
            .map_err(|error| AppError::Internal(format!("invalid username in storage: {error}")))?;
        Ok(User {
            id: Some(UserId::from_uuid(self.id)),
            username,
            primary_role_id: self.primary_role_id.map(RoleId::from_uuid),
        })
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    user_id: Uuid,
    role_id: Uuid,
    assigned_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self) -> UserRole {
        UserRole {
            id: Some(UserRoleId::from_uuid(self.id)),
            user_id: UserId::from_uuid(self.user_id),
            role_id: RoleId::from_uuid(self.role_id),
            assigned_at: Some(self.assigned_at),
        }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    permission_id: Uuid,
    user_id: Option<Uuid>,
    role_id: Option<Uuid>,
    access: String,
}

impl AssignmentRow {
    fn into_assignment(self) -> AppResult<PermissionAssignment> {
        let subject = match (self.user_id, self.role_id) {
            (Some(user_id), None) => SubjectRef::User(UserId::from_uuid(user_id)),
            (None, Some(role_id)) => SubjectRef::Role(RoleId::from_uuid(role_id)),
            _ => {
                return Err(AppError::Internal(format!(
                    "assignment '{}' does not reference exactly one subject",
                    self.id
                )));
            }
        };
        let access = Access::parse(self.access.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid access value in storage: {error}"))
        })?;

        Ok(PermissionAssignment {
            id: Some(PermissionAssignmentId::from_uuid(self.id)),
            permission_id: PermissionId::from_uuid(self.permission_id),
            subject,
            access,
        })
    }
}

fn subject_columns(subject: SubjectRef) -> (Option<Uuid>, Option<Uuid>) {
    match subject {
        SubjectRef::User(user_id) => (Some(user_id.as_uuid()), None),
        SubjectRef::Role(role_id) => (None, Some(role_id.as_uuid())),
    }
}

fn map_write_error(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.is_unique_violation()
    {
        return AppError::Conflict(format!("{context}: {database_error}"));
    }

    AppError::Internal(format!("{context}: {error}"))
}
