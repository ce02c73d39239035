use std::sync::Arc;

use pathkey_core::{AppError, AppResult};

use crate::{CurrentUserProvider, UserAccessService};

/// Access checks for the user supplied by the surrounding session layer.
///
/// Call sites gate request handling with `require` before touching a
/// protected resource.
#[derive(Clone)]
pub struct AccessGate {
    current_user: Arc<dyn CurrentUserProvider>,
    users: UserAccessService,
}

impl AccessGate {
    /// Creates a new gate from required dependencies.
    #[must_use]
    pub fn new(current_user: Arc<dyn CurrentUserProvider>, users: UserAccessService) -> Self {
        Self {
            current_user,
            users,
        }
    }

    /// Resolves the permission path for the active user.
    pub async fn can(&self, path: &str) -> AppResult<bool> {
        let user = self.current_user.current_user().await?;
        self.users.can(&user, path).await
    }

    /// Ensures the active user may act on the permission path.
    pub async fn require(&self, path: &str) -> AppResult<()> {
        let user = self.current_user.current_user().await?;

        if self.users.can(&user, path).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "user '{}' is denied permission path '{path}'",
            user.username
        )))
    }
}
