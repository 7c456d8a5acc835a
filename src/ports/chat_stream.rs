//! Chat stream port - streaming LLM completions.

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::domain::conversation::{ChatMode, Role, StreamEvent, StreamTransportError};

/// A pinned stream of decoded events from a chat completion.
pub type EventStream =
    Pin<Box<dyn Stream<Item = Result<StreamEvent, StreamTransportError>> + Send>>;

/// One turn of context sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: Role,
    pub content: String,
}

impl ProviderMessage {
    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Request for a streamed chat completion.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation history, oldest first, ending with the current query.
    pub messages: Vec<ProviderMessage>,
    /// Requested generation mode (search mode yields citations).
    pub mode: ChatMode,
}

impl ChatRequest {
    /// Creates a request with the given mode and no history.
    pub fn new(mode: ChatMode) -> Self {
        Self {
            messages: Vec::new(),
            mode,
        }
    }

    /// Appends a turn.
    pub fn with_message(mut self, message: ProviderMessage) -> Self {
        self.messages.push(message);
        self
    }
}

/// Port for streaming chat completions from an LLM provider.
#[async_trait]
pub trait ChatStreamClient: Send + Sync {
    /// Opens a completion stream for the given request.
    ///
    /// The returned stream yields decoded [`StreamEvent`]s; transport
    /// failures surface as `Err` items or as an error opening the stream.
    async fn stream_chat(&self, request: ChatRequest) -> Result<EventStream, StreamTransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_accumulates_turns() {
        let request = ChatRequest::new(ChatMode::Search)
            .with_message(ProviderMessage::user("question"))
            .with_message(ProviderMessage::assistant("answer"))
            .with_message(ProviderMessage::user("follow-up"));

        assert_eq!(request.mode, ChatMode::Search);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[2].content, "follow-up");
    }
}
