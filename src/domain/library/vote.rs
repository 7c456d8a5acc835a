//! Per-message votes.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp, UserId};

/// Direction of a vote on an assistant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteValue {
    Up,
    Down,
}

/// One user's vote on one message. A user holds at most one vote per
/// message; repeat votes replace the previous value (upsert semantics).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub value: VoteValue,
    pub created_at: Timestamp,
}

impl Vote {
    /// Creates a new vote stamped with the current time.
    pub fn new(message_id: MessageId, user_id: UserId, value: VoteValue) -> Self {
        Self {
            message_id,
            user_id,
            value,
            created_at: Timestamp::now(),
        }
    }
}
