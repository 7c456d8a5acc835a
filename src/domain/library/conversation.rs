//! Persisted conversation record and its stored messages.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ChatMode, Citation, ImagePayload, Role};
use crate::domain::foundation::{
    ConversationId, FolderId, MessageId, Timestamp, UserId, ValidationError,
};

/// Maximum length of a conversation title, in characters.
pub const MAX_TITLE_LEN: usize = 80;

/// Derives a conversation title from the first user query.
///
/// Truncates to [`MAX_TITLE_LEN`] characters on a char boundary; an empty or
/// image-only query yields a generic title.
pub fn derive_title(first_query: &str) -> String {
    let trimmed = first_query.trim();
    if trimmed.is_empty() {
        return "New conversation".to_string();
    }
    if trimmed.chars().count() <= MAX_TITLE_LEN {
        return trimmed.to_string();
    }
    trimmed.chars().take(MAX_TITLE_LEN).collect()
}

/// A conversation as stored server-side, scoped to its owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub user_id: UserId,
    pub title: String,
    pub folder_id: Option<FolderId>,
    pub is_archived: bool,
    /// Set when this conversation was branched from another (e.g. by
    /// continuing a shared conversation).
    pub parent_conversation_id: Option<ConversationId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ConversationRecord {
    /// Creates a new conversation owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty title.
    pub fn new(user_id: UserId, title: impl Into<String>) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: ConversationId::new(),
            user_id,
            title,
            folder_id: None,
            is_archived: false,
            parent_conversation_id: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Marks this conversation as branched from `parent`.
    pub fn with_parent(mut self, parent: ConversationId) -> Self {
        self.parent_conversation_id = Some(parent);
        self
    }

    /// Renames the conversation.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or over-long title.
    pub fn rename(&mut self, title: impl Into<String>) -> Result<(), ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ValidationError::too_long("title", MAX_TITLE_LEN));
        }
        self.title = title;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Moves the conversation into a folder (or out, with `None`).
    pub fn move_to_folder(&mut self, folder_id: Option<FolderId>) {
        self.folder_id = folder_id;
        self.updated_at = Timestamp::now();
    }

    /// Sets the archived flag.
    pub fn set_archived(&mut self, archived: bool) {
        self.is_archived = archived;
        self.updated_at = Timestamp::now();
    }

    /// True if `user` owns this conversation.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user_id == user
    }
}

/// One persisted message within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub content: String,
    pub images: Vec<ImagePayload>,
    pub citations: Vec<Citation>,
    /// Mode that produced an assistant turn; `None` for user turns.
    pub mode: Option<ChatMode>,
    pub created_at: Timestamp,
}

impl StoredMessage {
    /// Creates a user message for persistence.
    pub fn user(
        conversation_id: ConversationId,
        content: impl Into<String>,
        images: Vec<ImagePayload>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: Role::User,
            content: content.into(),
            images,
            citations: Vec::new(),
            mode: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates an assistant message for persistence.
    pub fn assistant(
        conversation_id: ConversationId,
        content: impl Into<String>,
        images: Vec<ImagePayload>,
        citations: Vec<Citation>,
        mode: ChatMode,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            role: Role::Assistant,
            content: content.into(),
            images,
            citations,
            mode: Some(mode),
            created_at: Timestamp::now(),
        }
    }
}
