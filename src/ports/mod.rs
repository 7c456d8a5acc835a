//! Ports - interfaces between the domain and the outside world.
//!
//! Adapters implement these traits; handlers depend only on the traits so
//! providers and storage can be swapped (or mocked in tests) without
//! touching the core.

mod chat_stream;
mod conversation_repository;
mod engagement_repository;
mod folder_repository;
mod image_generator;
mod share_repository;
mod speech_synthesizer;
mod token_verifier;
mod transcriber;

pub use chat_stream::{ChatRequest, ChatStreamClient, EventStream, ProviderMessage};
pub use conversation_repository::ConversationRepository;
pub use engagement_repository::EngagementRepository;
pub use folder_repository::FolderRepository;
pub use image_generator::{ImageError, ImageGenerator};
pub use share_repository::ShareRepository;
pub use speech_synthesizer::{SpeechError, SpeechSynthesizer};
pub use token_verifier::{AuthError, AuthenticatedUser, TokenVerifier};
pub use transcriber::{TranscriptionError, Transcriber};
