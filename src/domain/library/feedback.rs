//! Free-form user feedback.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::foundation::{
    ConversationId, MessageId, Timestamp, UserId, ValidationError,
};

/// Maximum feedback length, in characters.
const MAX_FEEDBACK_LEN: usize = 4000;

/// Unique identifier for a feedback entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(Uuid);

impl FeedbackId {
    /// Creates a new random FeedbackId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a FeedbackId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for FeedbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeedbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A free-form feedback entry, optionally bound to the conversation or
/// message it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: FeedbackId,
    pub user_id: UserId,
    pub conversation_id: Option<ConversationId>,
    pub message_id: Option<MessageId>,
    pub content: String,
    pub created_at: Timestamp,
}

impl Feedback {
    /// Creates a feedback entry.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or over-long content.
    pub fn new(user_id: UserId, content: impl Into<String>) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        if content.chars().count() > MAX_FEEDBACK_LEN {
            return Err(ValidationError::too_long("content", MAX_FEEDBACK_LEN));
        }
        Ok(Self {
            id: FeedbackId::new(),
            user_id,
            conversation_id: None,
            message_id: None,
            content,
            created_at: Timestamp::now(),
        })
    }

    /// Binds the feedback to a conversation.
    pub fn about_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    /// Binds the feedback to a specific message.
    pub fn about_message(mut self, id: MessageId) -> Self {
        self.message_id = Some(id);
        self
    }
}
