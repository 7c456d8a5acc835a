//! HTTP DTOs and wire frames for the AI proxy endpoints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::conversation::{
    ChatMode, Citation, GeneratedImage, ImagePayload, RetryFlavor, StreamEvent,
};

/// Request body for POST /api/chat.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamRequest {
    /// Conversation to continue; omitted to start a new one.
    pub conversation_id: Option<Uuid>,
    pub query: String,
    #[serde(default)]
    pub images: Vec<ImagePayload>,
    #[serde(default = "default_mode")]
    pub mode: ChatMode,
}

fn default_mode() -> ChatMode {
    ChatMode::Default
}

/// Request body for the regenerate endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateRequest {
    #[serde(default)]
    pub flavor: RetryFlavorDto,
}

/// Wire form of a retry flavor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryFlavorDto {
    #[default]
    TryAgain,
    AddDetails,
    MoreConcise,
    ThinkLonger,
    SearchWeb,
    Custom {
        query: String,
    },
}

impl From<RetryFlavorDto> for RetryFlavor {
    fn from(dto: RetryFlavorDto) -> Self {
        match dto {
            RetryFlavorDto::TryAgain => RetryFlavor::TryAgain,
            RetryFlavorDto::AddDetails => RetryFlavor::AddDetails,
            RetryFlavorDto::MoreConcise => RetryFlavor::MoreConcise,
            RetryFlavorDto::ThinkLonger => RetryFlavor::ThinkLonger,
            RetryFlavorDto::SearchWeb => RetryFlavor::SearchWeb,
            RetryFlavorDto::Custom { query } => RetryFlavor::Custom(query),
        }
    }
}

/// One SSE frame in the wire format the client consumes.
///
/// Serializes to single-key objects: `{"content": ...}`,
/// `{"citations": [...]}`, `{"done": true}`, `{"error": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WireFrame {
    Content { content: String },
    Citations { citations: Vec<Citation> },
    Done { done: bool },
    Error { error: String },
}

impl WireFrame {
    /// The terminal success frame.
    pub fn done() -> Self {
        Self::Done { done: true }
    }

    /// The terminal failure frame.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

impl From<StreamEvent> for WireFrame {
    fn from(event: StreamEvent) -> Self {
        match event {
            StreamEvent::Content(content) => Self::Content { content },
            StreamEvent::Citations(citations) => Self::Citations { citations },
            StreamEvent::Done => Self::done(),
            StreamEvent::Error(error) => Self::Error { error },
        }
    }
}

/// Request body for POST /api/images.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

/// Request body for POST /api/images/edit.
#[derive(Debug, Clone, Deserialize)]
pub struct EditImageRequest {
    pub prompt: String,
    pub references: Vec<ImagePayload>,
}

/// Response body for the image endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    pub content: String,
    pub images: Vec<ImagePayload>,
}

impl From<GeneratedImage> for ImageResponse {
    fn from(image: GeneratedImage) -> Self {
        Self {
            content: image.content,
            images: image.images,
        }
    }
}

/// Response body for POST /api/transcriptions.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// Request body for POST /api/speech.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
}
