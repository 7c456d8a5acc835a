//! AI provider adapters.
//!
//! HTTP clients implementing the AI-facing ports: streaming chat, image
//! generation with credential failover, transcription with model fallback,
//! and speech synthesis.

mod chat_client;
mod image_client;
mod speech_client;
mod transcription_client;

pub use chat_client::{ChatClientConfig, HttpChatClient};
pub use image_client::{FailoverImageGenerator, HttpImageClient, ImageClientConfig};
pub use speech_client::{HttpSpeechSynthesizer, SpeechClientConfig};
pub use transcription_client::{HttpTranscriber, TranscriptionClientConfig};
