//! Folder persistence port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, FolderId, UserId};
use crate::domain::library::Folder;

/// Port for folder persistence, scoped by owning user.
#[async_trait]
pub trait FolderRepository: Send + Sync {
    /// Creates a folder.
    async fn create(&self, folder: &Folder) -> Result<(), DomainError>;

    /// Fetches one folder owned by `user`.
    async fn find(&self, id: FolderId, user: &UserId) -> Result<Option<Folder>, DomainError>;

    /// Lists the user's folders by name.
    async fn list(&self, user: &UserId) -> Result<Vec<Folder>, DomainError>;

    /// Persists a rename.
    async fn update(&self, folder: &Folder) -> Result<(), DomainError>;

    /// Deletes a folder; conversations inside it fall back to no folder.
    async fn delete(&self, id: FolderId, user: &UserId) -> Result<(), DomainError>;
}
