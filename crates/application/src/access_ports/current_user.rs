use async_trait::async_trait;
use pathkey_core::AppResult;
use pathkey_domain::User;

/// Port answering "who is calling" for the surrounding session layer.
///
/// Authentication happens outside this crate; implementations typically read
/// the active session and load the matching user record.
#[async_trait]
pub trait CurrentUserProvider: Send + Sync {
    /// Returns the authenticated user for the current request context.
    async fn current_user(&self) -> AppResult<User>;
}
