//! Conversation domain - the in-memory chat session and the streaming
//! response assembly state machine.
//!
//! The centerpiece is [`StreamingConversationController`], which consumes a
//! decoded event stream ([`StreamEvent`]) produced by the wire decoder
//! ([`SseFrameDecoder`]), accumulates assistant content incrementally, and
//! reconciles retries as alternate versions of an existing turn.

mod controller;
mod message;
mod progress;
mod retry;
mod session;
mod stream;

pub use controller::{
    ImageOutcome, SendError, SendInput, SendOutcome, StreamingConversationController,
};
pub use message::{
    ChatMode, Citation, ConversationMessage, GeneratedImage, ImagePayload, RetryVersion, Role,
    MAX_ATTACHED_IMAGES, MAX_REFERENCE_IMAGES,
};
pub use progress::ProgressSimulator;
pub use retry::{derive_retry_prompt, RetryFlavor, RetryPrompt};
pub use session::{ConversationSession, MAX_HISTORY};
pub use stream::{SseFrameDecoder, StreamEvent, StreamTransportError};
