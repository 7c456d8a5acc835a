//! Speech-to-text port.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Transcription errors.
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    /// The audio payload was rejected (format, duration, size).
    #[error("audio rejected: {0}")]
    Rejected(String),

    /// Network failure during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Both the primary and fallback models failed.
    #[error("transcription failed on all models: {0}")]
    AllModelsFailed(String),
}

/// Port for audio transcription.
///
/// Implementations try a primary model first and fall back to a secondary
/// model on failure; only after both fail does an error surface.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribes an audio blob to text.
    async fn transcribe(&self, audio: Bytes, media_type: &str)
        -> Result<String, TranscriptionError>;
}
