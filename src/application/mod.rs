//! Application layer - command handlers wiring the streaming core to the
//! ports.
//!
//! Handlers own the orchestration a single HTTP request needs: resolve the
//! conversation, rebuild the in-memory session from persisted history,
//! drive the [`StreamingConversationController`] against a provider stream,
//! and persist the finished turns. They depend only on port traits so the
//! HTTP layer and tests can hand them whatever implementations they like.
//!
//! [`StreamingConversationController`]: crate::domain::conversation::StreamingConversationController

pub mod handlers;

pub use handlers::{
    RegenerateResponseCommand, RegenerateResponseError, RegenerateResponseHandler,
    RegenerateResult, SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult,
};
