//! Roles and user/role membership records.

use chrono::{DateTime, Utc};
use pathkey_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{Permissible, RoleId, SubjectRef, UserId, UserRoleId};

/// Validated role name, the human-facing key during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleName(NonEmptyString);

impl RoleName {
    /// Creates a validated role name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        Ok(Self(NonEmptyString::new(value)?))
    }

    /// Returns the role name string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Named group of users sharing permission assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Persisted identity, absent until saved.
    pub id: Option<RoleId>,
    /// Unique role name.
    pub name: RoleName,
}

impl Role {
    /// Creates an unsaved role.
    #[must_use]
    pub fn new(name: RoleName) -> Self {
        Self { id: None, name }
    }
}

impl Permissible for Role {
    fn saved_subject(&self) -> Option<SubjectRef> {
        self.id.map(SubjectRef::Role)
    }
}

/// Membership row linking a user to a secondary role.
///
/// Uniqueness of the `(user_id, role_id)` pair is enforced by the mutation
/// operations, not the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    /// Persisted identity, absent until saved.
    pub id: Option<UserRoleId>,
    /// The member user.
    pub user_id: UserId,
    /// The role the user belongs to.
    pub role_id: RoleId,
    /// When the membership was persisted, set by the store on first save.
    pub assigned_at: Option<DateTime<Utc>>,
}

impl UserRole {
    /// Creates an unsaved membership row.
    #[must_use]
    pub fn new(user_id: UserId, role_id: RoleId) -> Self {
        Self {
            id: None,
            user_id,
            role_id,
            assigned_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, RoleName};
    use crate::{Permissible, RoleId, SubjectRef};

    #[test]
    fn role_name_rejects_whitespace() {
        assert!(RoleName::new("  ").is_err());
    }

    #[test]
    fn unsaved_role_has_no_subject() {
        let name = RoleName::new("operators");
        assert!(name.is_ok());
        let role = Role::new(name.unwrap_or_else(|_| unreachable!()));
        assert!(role.saved_subject().is_none());
    }

    #[test]
    fn saved_role_is_a_role_subject() {
        let name = RoleName::new("operators");
        assert!(name.is_ok());
        let mut role = Role::new(name.unwrap_or_else(|_| unreachable!()));
        let role_id = RoleId::new();
        role.id = Some(role_id);
        assert_eq!(role.saved_subject(), Some(SubjectRef::Role(role_id)));
    }
}
