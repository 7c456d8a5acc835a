//! HTTP DTOs for conversation endpoints.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::domain::conversation::{ChatMode, Citation, ImagePayload, Role};
use crate::domain::library::{ConversationRecord, StoredMessage};

// ----- Request DTOs -----

/// Request to create a conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConversationRequest {
    /// Title; when omitted, derived from `first_query` (or a generic
    /// fallback).
    #[serde(default)]
    pub title: Option<String>,
    /// First user query, used for title derivation.
    #[serde(default)]
    pub first_query: Option<String>,
    /// Parent conversation when branching from a shared conversation.
    #[serde(default)]
    pub parent_conversation_id: Option<Uuid>,
}

/// Partial update of a conversation.
///
/// `folder_id` distinguishes "not sent" (no change) from `null` (move out
/// of its folder) via the nested Option.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateConversationRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_id: Option<Option<Uuid>>,
    #[serde(default)]
    pub is_archived: Option<bool>,
}

/// Keeps a present-but-null field distinct from an absent one.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Query string for conversation listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListConversationsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

// ----- Response DTOs -----

/// One conversation in list and detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub title: String,
    pub folder_id: Option<Uuid>,
    pub is_archived: bool,
    pub parent_conversation_id: Option<Uuid>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ConversationRecord> for ConversationResponse {
    fn from(record: &ConversationRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            title: record.title.clone(),
            folder_id: record.folder_id.as_ref().map(|f| *f.as_uuid()),
            is_archived: record.is_archived,
            parent_conversation_id: record
                .parent_conversation_id
                .as_ref()
                .map(|p| *p.as_uuid()),
            created_at: record.created_at.to_string(),
            updated_at: record.updated_at.to_string(),
        }
    }
}

/// One stored message in detail responses.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub images: Vec<ImagePayload>,
    pub citations: Vec<Citation>,
    pub mode: Option<ChatMode>,
    pub created_at: String,
}

impl From<&StoredMessage> for MessageResponse {
    fn from(message: &StoredMessage) -> Self {
        Self {
            id: *message.id.as_uuid(),
            role: message.role,
            content: message.content.clone(),
            images: message.images.clone(),
            citations: message.citations.clone(),
            mode: message.mode,
            created_at: message.created_at.to_string(),
        }
    }
}

/// Conversation with its full message history.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationDetailResponse {
    #[serde(flatten)]
    pub conversation: ConversationResponse,
    pub messages: Vec<MessageResponse>,
}
