//! Permissions, assignments, and the subjects that hold them.

use pathkey_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::{PermissionAssignmentId, PermissionId, PermissionPath, RoleId, UserId};

/// Access value stored on a permission assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// The subject may act on the permission path.
    Allowed,
    /// The subject may not act on the permission path.
    #[default]
    Denied,
}

impl Access {
    /// Returns a stable storage value for this access setting.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied => "denied",
        }
    }

    /// Parses a storage value into an access setting.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "allowed" => Ok(Self::Allowed),
            "denied" => Ok(Self::Denied),
            _ => Err(AppError::Validation(format!(
                "unknown access value '{value}'"
            ))),
        }
    }

    /// Returns whether this setting grants access.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Named capability addressed by a hierarchical path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Persisted identity, absent until saved.
    pub id: Option<PermissionId>,
    /// Unique hierarchical path.
    pub path: PermissionPath,
    /// Human-readable display label.
    pub name: String,
}

impl Permission {
    /// Creates an unsaved permission whose name defaults to the path text.
    #[must_use]
    pub fn new(path: PermissionPath) -> Self {
        let name = path.as_str().to_owned();
        Self {
            id: None,
            path,
            name,
        }
    }

    /// Creates an unsaved permission with an explicit display label.
    #[must_use]
    pub fn with_name(path: PermissionPath, name: impl Into<String>) -> Self {
        Self {
            id: None,
            path,
            name: name.into(),
        }
    }
}

/// Reference to the single subject holding an assignment.
///
/// An assignment belongs to exactly one user or exactly one role; the enum
/// makes any other shape unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectRef {
    /// A user-scoped subject.
    User(UserId),
    /// A role-scoped subject.
    Role(RoleId),
}

impl SubjectRef {
    /// Returns whether the subject is a role.
    #[must_use]
    pub fn is_role(&self) -> bool {
        matches!(self, Self::Role(_))
    }
}

/// Entities that can hold permission assignments.
pub trait Permissible {
    /// Returns the subject reference when the entity has a persisted
    /// identity, `None` otherwise.
    fn saved_subject(&self) -> Option<SubjectRef>;
}

/// Binding of one subject to one permission with an access value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionAssignment {
    /// Persisted identity, absent until saved.
    pub id: Option<PermissionAssignmentId>,
    /// The permission being granted or denied.
    pub permission_id: PermissionId,
    /// The subject holding the assignment.
    pub subject: SubjectRef,
    /// Grant or denial.
    pub access: Access,
}

impl PermissionAssignment {
    /// Creates an unsaved assignment.
    #[must_use]
    pub fn new(permission_id: PermissionId, subject: SubjectRef, access: Access) -> Self {
        Self {
            id: None,
            permission_id,
            subject,
            access,
        }
    }
}
