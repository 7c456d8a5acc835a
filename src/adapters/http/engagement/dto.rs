//! HTTP DTOs for vote and feedback endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::library::{Vote, VoteValue};

/// Request to cast a vote on a message.
#[derive(Debug, Clone, Deserialize)]
pub struct CastVoteRequest {
    pub value: VoteValue,
}

/// One vote in responses.
#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub message_id: Uuid,
    pub value: VoteValue,
    pub created_at: String,
}

impl From<&Vote> for VoteResponse {
    fn from(vote: &Vote) -> Self {
        Self {
            message_id: *vote.message_id.as_uuid(),
            value: vote.value,
            created_at: vote.created_at.to_string(),
        }
    }
}

/// Request to submit feedback.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitFeedbackRequest {
    pub content: String,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub message_id: Option<Uuid>,
}

/// Acknowledgement for recorded feedback.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub created_at: String,
}
