//! Text-to-speech port.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Speech synthesis errors.
#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// The text was rejected (empty, too long).
    #[error("text rejected: {0}")]
    Rejected(String),

    /// Network failure during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider returned an unusable response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Port for text-to-speech synthesis.
///
/// Implementations normalize whatever body shape the provider returns into
/// one canonical byte buffer before it reaches the core.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesizes speech audio for the given text.
    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError>;
}
