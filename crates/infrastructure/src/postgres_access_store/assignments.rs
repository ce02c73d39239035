use async_trait::async_trait;
use pathkey_application::{AssignmentStore, PathAssignment};
use pathkey_core::{AppError, AppResult};
use pathkey_domain::{
    PermissionAssignment, PermissionAssignmentId, PermissionId, PermissionPath, RoleId,
    SubjectRef,
};
use sqlx::FromRow;
use uuid::Uuid;

use super::{AssignmentRow, PostgresAccessStore, map_write_error, subject_columns};

#[derive(Debug, FromRow)]
struct PathAssignmentRow {
    id: Uuid,
    permission_id: Uuid,
    user_id: Option<Uuid>,
    role_id: Option<Uuid>,
    access: String,
    path: String,
}

impl PathAssignmentRow {
    fn into_path_assignment(self) -> AppResult<PathAssignment> {
        let path = PermissionPath::new(self.path).map_err(|error| {
            AppError::Internal(format!("invalid permission path in storage: {error}"))
        })?;
        let assignment = AssignmentRow {
            id: self.id,
            permission_id: self.permission_id,
            user_id: self.user_id,
            role_id: self.role_id,
            access: self.access,
        }
        .into_assignment()?;

        Ok(PathAssignment { assignment, path })
    }
}

#[async_trait]
impl AssignmentStore for PostgresAccessStore {
    async fn find_for_subject(
        &self,
        subject: SubjectRef,
        permission_id: PermissionId,
    ) -> AppResult<Option<PermissionAssignment>> {
        let (user_id, role_id) = subject_columns(subject);

        let row = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT id, permission_id, user_id, role_id, access
            FROM auth_permission_assignments
            WHERE (user_id = $1 OR role_id = $2)
                AND permission_id = $3
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load assignment: {error}")))?;

        row.map(AssignmentRow::into_assignment).transpose()
    }

    async fn list_for_subject_in_paths(
        &self,
        subject: SubjectRef,
        paths: &[PermissionPath],
    ) -> AppResult<Vec<PathAssignment>> {
        let (user_id, role_id) = subject_columns(subject);
        let path_values: Vec<String> = paths
            .iter()
            .map(|path| path.as_str().to_owned())
            .collect();

        let rows = sqlx::query_as::<_, PathAssignmentRow>(
            r#"
            SELECT
                assignments.id,
                assignments.permission_id,
                assignments.user_id,
                assignments.role_id,
                assignments.access,
                permissions.path
            FROM auth_permission_assignments AS assignments
            INNER JOIN auth_permissions AS permissions
                ON permissions.id = assignments.permission_id
            WHERE (assignments.user_id = $1 OR assignments.role_id = $2)
                AND permissions.path = ANY($3)
            ORDER BY permissions.path
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .bind(&path_values)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list assignments: {error}")))?;

        rows.into_iter()
            .map(PathAssignmentRow::into_path_assignment)
            .collect()
    }

    async fn save(&self, mut assignment: PermissionAssignment) -> AppResult<PermissionAssignment> {
        let assignment_id = assignment.id.unwrap_or_else(PermissionAssignmentId::new);
        assignment.id = Some(assignment_id);
        let (user_id, role_id) = subject_columns(assignment.subject);

        sqlx::query(
            r#"
            INSERT INTO auth_permission_assignments (id, permission_id, user_id, role_id, access)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET access = EXCLUDED.access
            "#,
        )
        .bind(assignment_id.as_uuid())
        .bind(assignment.permission_id.as_uuid())
        .bind(user_id)
        .bind(role_id)
        .bind(assignment.access.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| map_write_error(error, "failed to save assignment"))?;

        Ok(assignment)
    }

    async fn list_role_scoped_ids(&self) -> AppResult<Vec<PermissionAssignmentId>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM auth_permission_assignments
            WHERE role_id IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list role assignments: {error}"))
        })?;

        Ok(ids
            .into_iter()
            .map(PermissionAssignmentId::from_uuid)
            .collect())
    }

    async fn delete_by_ids(&self, ids: &[PermissionAssignmentId]) -> AppResult<u64> {
        let id_values: Vec<Uuid> = ids.iter().map(PermissionAssignmentId::as_uuid).collect();

        let result = sqlx::query(
            r#"
            DELETE FROM auth_permission_assignments
            WHERE id = ANY($1)
            "#,
        )
        .bind(&id_values)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete assignments: {error}")))?;

        Ok(result.rows_affected())
    }

    async fn delete_for_role(&self, role_id: RoleId) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM auth_permission_assignments
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to delete role assignments: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}
