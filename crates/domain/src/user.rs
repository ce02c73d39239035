//! User account records extended with role membership.

use pathkey_core::NonEmptyString;
use serde::{Deserialize, Serialize};

use crate::{Permissible, RoleId, SubjectRef, UserId};

/// Account that holds direct permission assignments and role memberships.
///
/// The primary role is optional and distinct from the many-to-many secondary
/// memberships recorded as [`crate::UserRole`] rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Persisted identity, absent until saved.
    pub id: Option<UserId>,
    /// Login name.
    pub username: NonEmptyString,
    /// Optional primary role.
    pub primary_role_id: Option<RoleId>,
}

impl User {
    /// Creates an unsaved user without a primary role.
    #[must_use]
    pub fn new(username: NonEmptyString) -> Self {
        Self {
            id: None,
            username,
            primary_role_id: None,
        }
    }
}

impl Permissible for User {
    fn saved_subject(&self) -> Option<SubjectRef> {
        self.id.map(SubjectRef::User)
    }
}

#[cfg(test)]
mod tests {
    use pathkey_core::NonEmptyString;

    use super::User;
    use crate::{Permissible, SubjectRef, UserId};

    #[test]
    fn saved_user_is_a_user_subject() {
        let username = NonEmptyString::new("bob");
        assert!(username.is_ok());
        let mut user = User::new(username.unwrap_or_else(|_| unreachable!()));
        assert!(user.saved_subject().is_none());

        let user_id = UserId::new();
        user.id = Some(user_id);
        assert_eq!(user.saved_subject(), Some(SubjectRef::User(user_id)));
    }
}
