//! Public conversation share links.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, ShareToken, Timestamp, UserId};

/// A share link exposing a read-only snapshot of a conversation.
///
/// The token is unguessable; anyone holding it may read the conversation
/// without authentication. Only the owner may create or revoke shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub token: ShareToken,
    pub conversation_id: ConversationId,
    pub user_id: UserId,
    pub created_at: Timestamp,
}

impl Share {
    /// Creates a share with a fresh random token.
    pub fn new(conversation_id: ConversationId, user_id: UserId) -> Self {
        Self {
            token: ShareToken::generate(),
            conversation_id,
            user_id,
            created_at: Timestamp::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_get_distinct_tokens() {
        let conversation = ConversationId::new();
        let user = UserId::new("user-1").unwrap();
        let a = Share::new(conversation, user.clone());
        let b = Share::new(conversation, user);
        assert_ne!(a.token, b.token);
    }
}
