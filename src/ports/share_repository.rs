//! Share link persistence port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ShareToken, UserId};
use crate::domain::library::Share;

/// Port for conversation share links.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Creates a share link.
    async fn create(&self, share: &Share) -> Result<(), DomainError>;

    /// Resolves a token to its share, if the link is still live.
    ///
    /// Unscoped by design: anyone holding the token may resolve it.
    async fn resolve(&self, token: &ShareToken) -> Result<Option<Share>, DomainError>;

    /// Lists the user's share links, newest first.
    async fn list(&self, user: &UserId) -> Result<Vec<Share>, DomainError>;

    /// Revokes a share link owned by `user`.
    async fn revoke(&self, token: &ShareToken, user: &UserId) -> Result<(), DomainError>;
}
