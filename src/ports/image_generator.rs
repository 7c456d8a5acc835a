//! Image generation port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::conversation::{GeneratedImage, ImagePayload};

/// Image provider errors.
///
/// `BudgetExhausted` is distinguished because the failover wrapper reacts
/// to it by silently moving to the next credential; every other error
/// surfaces to the caller immediately.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    /// The credential's spending budget is used up.
    #[error("image generation budget exhausted")]
    BudgetExhausted,

    /// The provider rejected the prompt (policy, size, etc.).
    #[error("image request rejected: {0}")]
    Rejected(String),

    /// API key or authentication failed.
    #[error("authentication with image provider failed")]
    AuthenticationFailed,

    /// Network failure during the request.
    #[error("network error: {0}")]
    Network(String),

    /// Provider response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid request (e.g. reference image count out of range).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ImageError {
    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// True when the failover chain should try the next credential.
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, ImageError::BudgetExhausted)
    }
}

/// Port for image generation and edit/remix.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates an image from a prompt.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, ImageError>;

    /// Edits or remixes using a prompt plus 1–6 reference images.
    async fn edit(
        &self,
        prompt: &str,
        references: &[ImagePayload],
    ) -> Result<GeneratedImage, ImageError>;
}
