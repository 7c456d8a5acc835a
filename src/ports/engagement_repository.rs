//! Votes and feedback persistence port.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, UserId};
use crate::domain::library::{Feedback, Vote};

/// Port for message votes and free-form feedback.
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Inserts or replaces the user's vote on a message.
    async fn upsert_vote(&self, vote: &Vote) -> Result<(), DomainError>;

    /// Removes the user's vote on a message, if present.
    async fn remove_vote(&self, message_id: MessageId, user: &UserId) -> Result<(), DomainError>;

    /// Fetches the user's votes across one conversation.
    async fn votes_for_conversation(
        &self,
        conversation_id: ConversationId,
        user: &UserId,
    ) -> Result<Vec<Vote>, DomainError>;

    /// Records a feedback entry.
    async fn record_feedback(&self, feedback: &Feedback) -> Result<(), DomainError>;
}
