//! In-memory conversation session.
//!
//! Mirrors one persisted conversation on the client side. History is
//! bounded to the most recent [`MAX_HISTORY`] messages; the bound protects
//! memory, it is not load-bearing for correctness.

use crate::domain::foundation::{ConversationId, MessageId};

use super::message::{ConversationMessage, Role};

/// Maximum number of messages retained in memory per session.
pub const MAX_HISTORY: usize = 100;

/// Ordered message history for one conversation, client-held.
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    messages: Vec<ConversationMessage>,
    started: bool,
    conversation_id: Option<ConversationId>,
}

impl ConversationSession {
    /// Creates an empty, unbound session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message, dropping the oldest if the window is full.
    pub fn push(&mut self, message: ConversationMessage) -> MessageId {
        let id = message.id();
        self.messages.push(message);
        if self.messages.len() > MAX_HISTORY {
            let excess = self.messages.len() - MAX_HISTORY;
            self.messages.drain(..excess);
        }
        self.started = true;
        id
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any turn has been added yet.
    pub fn started(&self) -> bool {
        self.started
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    /// Finds a message by id.
    pub fn find(&self, id: MessageId) -> Option<&ConversationMessage> {
        self.messages.iter().find(|m| m.id() == id)
    }

    /// Finds a message by id for mutation.
    pub fn find_mut(&mut self, id: MessageId) -> Option<&mut ConversationMessage> {
        self.messages.iter_mut().find(|m| m.id() == id)
    }

    /// Returns the message at a position, if still in range.
    pub fn get(&self, index: usize) -> Option<&ConversationMessage> {
        self.messages.get(index)
    }

    /// Returns the current index of a message, if present.
    pub fn index_of(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id() == id)
    }

    /// Scans backward from (and excluding) `index` for the nearest user
    /// message. Used to derive retry inputs when a turn carries no recorded
    /// originals.
    pub fn nearest_user_before(&self, index: usize) -> Option<&ConversationMessage> {
        self.messages
            .iter()
            .take(index.min(self.messages.len()))
            .rev()
            .find(|m| m.role() == Role::User)
    }

    /// Removes a message by id. Returns true if it was present.
    pub fn remove(&mut self, id: MessageId) -> bool {
        match self.index_of(id) {
            Some(idx) => {
                self.messages.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Truncates history back to `len` messages, dropping the newest.
    ///
    /// Used to roll back an image-generation placeholder on failure.
    pub fn truncate_to(&mut self, len: usize) {
        self.messages.truncate(len);
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Binds this session to a persisted conversation.
    pub fn bind(&mut self, id: ConversationId) {
        self.conversation_id = Some(id);
    }

    /// The bound persisted conversation, if any.
    pub fn conversation_id(&self) -> Option<ConversationId> {
        self.conversation_id
    }
}
