//! Conversation persistence port.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, UserId};
use crate::domain::library::{ConversationRecord, StoredMessage};

/// Port for conversation and message persistence.
///
/// Every read and write is scoped by the owning user id; a conversation
/// that exists but belongs to someone else behaves exactly like one that
/// does not exist.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Creates a conversation.
    async fn create(&self, record: &ConversationRecord) -> Result<(), DomainError>;

    /// Fetches one conversation owned by `user`.
    async fn find(
        &self,
        id: ConversationId,
        user: &UserId,
    ) -> Result<Option<ConversationRecord>, DomainError>;

    /// Lists the user's conversations, most recently updated first.
    async fn list(
        &self,
        user: &UserId,
        include_archived: bool,
    ) -> Result<Vec<ConversationRecord>, DomainError>;

    /// Persists title/folder/archive changes.
    async fn update(&self, record: &ConversationRecord) -> Result<(), DomainError>;

    /// Deletes a conversation and its messages.
    async fn delete(&self, id: ConversationId, user: &UserId) -> Result<(), DomainError>;

    /// Appends one message to a conversation.
    async fn append_message(&self, message: &StoredMessage) -> Result<(), DomainError>;

    /// Fetches a conversation's messages in creation order.
    async fn messages(
        &self,
        id: ConversationId,
        user: &UserId,
    ) -> Result<Vec<StoredMessage>, DomainError>;
}
