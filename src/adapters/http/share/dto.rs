//! HTTP DTOs for share endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::library::Share;

use super::super::conversation::dto::MessageResponse;

/// Request to create a share link.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShareRequest {
    pub conversation_id: Uuid,
}

/// One share link in responses.
#[derive(Debug, Clone, Serialize)]
pub struct ShareResponse {
    pub token: String,
    pub conversation_id: Uuid,
    pub created_at: String,
}

impl From<&Share> for ShareResponse {
    fn from(share: &Share) -> Self {
        Self {
            token: share.token.as_str().to_string(),
            conversation_id: *share.conversation_id.as_uuid(),
            created_at: share.created_at.to_string(),
        }
    }
}

/// Read-only snapshot returned for a resolved share token.
#[derive(Debug, Clone, Serialize)]
pub struct SharedConversationResponse {
    pub title: String,
    pub messages: Vec<MessageResponse>,
    pub shared_at: String,
}
