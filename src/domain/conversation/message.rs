//! Message entity for in-memory conversation sessions.
//!
//! A message is one turn: a user query (with optional image attachments) or
//! an assistant response. Assistant content is mutable while a stream is
//! active and immutable once finalized; regenerated completions are retained
//! as retry versions alongside the original rather than replacing it.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{MessageId, Timestamp, ValidationError};

/// Maximum number of images a user may attach to one query.
pub const MAX_ATTACHED_IMAGES: usize = 3;

/// Maximum number of reference images for an edit/remix request.
pub const MAX_REFERENCE_IMAGES: usize = 6;

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// User input.
    User,
    /// AI assistant response.
    Assistant,
}

/// Generation mode requested for an assistant turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Plain chat completion.
    Default,
    /// Web-search augmented completion (responses carry citations).
    Search,
    /// Provider decides whether to search.
    Auto,
    /// Image generation (single request/response, no text stream).
    Image,
}

impl ChatMode {
    /// Returns true for the modes that stream text deltas.
    pub fn is_text(&self) -> bool {
        !matches!(self, ChatMode::Image)
    }
}

/// A source citation attached to a search-augmented response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Human-readable source title.
    pub title: String,
    /// Source URL.
    pub url: String,
}

impl Citation {
    /// Creates a new citation.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

/// An image carried inline as base64, with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data: String,
    /// MIME type, e.g. "image/png".
    pub media_type: String,
}

impl ImagePayload {
    /// Wraps already-encoded base64 data.
    pub fn new(data: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
        }
    }

    /// Encodes raw bytes into a payload.
    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            media_type: media_type.into(),
        }
    }

    /// Decodes the payload back into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the data is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, ValidationError> {
        BASE64
            .decode(&self.data)
            .map_err(|e| ValidationError::invalid_format("image.data", e.to_string()))
    }
}

/// Result of one image-generation request: the caption the provider returned
/// (possibly empty) and the produced images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Caption or revised prompt text to display with the images.
    pub content: String,
    /// Produced images.
    pub images: Vec<ImagePayload>,
}

/// One alternate completion for an assistant turn, produced by a retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryVersion {
    /// The alternate content.
    pub content: String,
    /// Citations for the alternate, if any.
    pub citations: Vec<Citation>,
    /// When this version finished generating.
    pub created_at: Timestamp,
}

impl RetryVersion {
    /// Creates a new retry version stamped with the current time.
    pub fn new(content: impl Into<String>, citations: Vec<Citation>) -> Self {
        Self {
            content: content.into(),
            citations,
            created_at: Timestamp::now(),
        }
    }
}

/// One turn in an in-memory conversation session.
///
/// # Invariants
///
/// - `current_retry_index` ∈ [0, retry_versions.len()]; index 0 is the
///   original `content`/`citations`, index i ≥ 1 is `retry_versions[i-1]`.
/// - Once `finalized`, `content` never changes; retries only append to
///   `retry_versions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    id: MessageId,
    role: Role,
    content: String,
    images: Vec<ImagePayload>,
    citations: Vec<Citation>,
    retry_versions: Vec<RetryVersion>,
    current_retry_index: usize,
    original_query: Option<String>,
    original_images: Vec<ImagePayload>,
    original_mode: Option<ChatMode>,
    finalized: bool,
    created_at: Timestamp,
}

impl ConversationMessage {
    /// Creates a user message.
    ///
    /// # Errors
    ///
    /// - empty query with no attached images
    /// - more than [`MAX_ATTACHED_IMAGES`] images
    pub fn user(
        content: impl Into<String>,
        images: Vec<ImagePayload>,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() && images.is_empty() {
            return Err(ValidationError::empty_field("query"));
        }
        if images.len() > MAX_ATTACHED_IMAGES {
            return Err(ValidationError::too_many_items(
                "images",
                MAX_ATTACHED_IMAGES,
                images.len(),
            ));
        }

        Ok(Self {
            id: MessageId::new(),
            role: Role::User,
            content,
            images,
            citations: Vec::new(),
            retry_versions: Vec::new(),
            current_retry_index: 0,
            original_query: None,
            original_images: Vec::new(),
            original_mode: None,
            finalized: true,
            created_at: Timestamp::now(),
        })
    }

    /// Creates an empty assistant message to stream into.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::new(),
            role: Role::Assistant,
            content: String::new(),
            images: Vec::new(),
            citations: Vec::new(),
            retry_versions: Vec::new(),
            current_retry_index: 0,
            original_query: None,
            original_images: Vec::new(),
            original_mode: None,
            finalized: false,
            created_at: Timestamp::now(),
        }
    }

    /// Creates an already-finalized assistant message in one step.
    ///
    /// Used when a retry's target has vanished and the accumulated content
    /// must be appended as a fresh turn.
    pub fn assistant_finalized(
        content: impl Into<String>,
        citations: Vec<Citation>,
        original_query: Option<String>,
        original_images: Vec<ImagePayload>,
        original_mode: Option<ChatMode>,
    ) -> Self {
        let mut msg = Self::assistant_placeholder();
        msg.content = content.into();
        msg.citations = citations;
        msg.original_query = original_query;
        msg.original_images = original_images;
        msg.original_mode = original_mode;
        msg.finalized = true;
        msg
    }

    /// Appends a streamed delta to the content.
    ///
    /// No-op once the message is finalized; content only grows while a
    /// stream is active.
    pub fn append_delta(&mut self, delta: &str) {
        if !self.finalized {
            self.content.push_str(delta);
        }
    }

    /// Finalizes the message after a stream completes (or is cancelled).
    ///
    /// Attaches pending citations and records the inputs that produced this
    /// turn so a later retry can re-issue them without re-deriving from
    /// surrounding history.
    pub fn finalize(
        &mut self,
        citations: Vec<Citation>,
        original_query: Option<String>,
        original_images: Vec<ImagePayload>,
        original_mode: Option<ChatMode>,
    ) {
        self.citations = citations;
        self.original_query = original_query;
        self.original_images = original_images;
        self.original_mode = original_mode;
        self.finalized = true;
    }

    /// Replaces placeholder content with an image-generation result.
    pub fn apply_image_result(&mut self, result: GeneratedImage, original_query: Option<String>) {
        self.content = result.content;
        self.images = result.images;
        self.original_query = original_query;
        self.original_mode = Some(ChatMode::Image);
        self.finalized = true;
    }

    /// Appends an alternate completion and makes it the displayed version.
    ///
    /// The original `content` is never touched; after this call
    /// `current_retry_index() == retry_versions().len()`.
    pub fn push_retry_version(&mut self, version: RetryVersion) {
        self.retry_versions.push(version);
        self.current_retry_index = self.retry_versions.len();
    }

    /// Selects which version is displayed.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `index > retry_versions.len()`.
    pub fn select_version(&mut self, index: usize) -> Result<(), ValidationError> {
        if index > self.retry_versions.len() {
            return Err(ValidationError::invalid_format(
                "retry_index",
                format!(
                    "index {} out of range (have {} versions)",
                    index,
                    self.retry_versions.len()
                ),
            ));
        }
        self.current_retry_index = index;
        Ok(())
    }

    /// Returns the content of the currently displayed version.
    pub fn displayed_content(&self) -> &str {
        if self.current_retry_index == 0 {
            &self.content
        } else {
            &self.retry_versions[self.current_retry_index - 1].content
        }
    }

    /// Returns the citations of the currently displayed version.
    pub fn displayed_citations(&self) -> &[Citation] {
        if self.current_retry_index == 0 {
            &self.citations
        } else {
            &self.retry_versions[self.current_retry_index - 1].citations
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// The original content (version 0), regardless of displayed version.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn images(&self) -> &[ImagePayload] {
        &self.images
    }

    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn retry_versions(&self) -> &[RetryVersion] {
        &self.retry_versions
    }

    pub fn current_retry_index(&self) -> usize {
        self.current_retry_index
    }

    pub fn original_query(&self) -> Option<&str> {
        self.original_query.as_deref()
    }

    pub fn original_images(&self) -> &[ImagePayload] {
        &self.original_images
    }

    pub fn original_mode(&self) -> Option<ChatMode> {
        self.original_mode
    }

    /// True once the turn is complete and content is immutable.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_requires_query_or_images() {
        assert!(ConversationMessage::user("", Vec::new()).is_err());
        assert!(ConversationMessage::user("   ", Vec::new()).is_err());

        let with_image = ConversationMessage::user(
            "",
            vec![ImagePayload::from_bytes(b"png", "image/png")],
        );
        assert!(with_image.is_ok());
    }

    #[test]
    fn user_message_caps_attachments() {
        let images = vec![ImagePayload::from_bytes(b"x", "image/png"); 4];
        let err = ConversationMessage::user("look", images).unwrap_err();
        assert!(matches!(err, ValidationError::TooManyItems { .. }));
    }

    #[test]
    fn deltas_accumulate_until_finalized() {
        let mut msg = ConversationMessage::assistant_placeholder();
        msg.append_delta("Hel");
        msg.append_delta("lo");
        assert_eq!(msg.content(), "Hello");
        assert!(!msg.is_finalized());

        msg.finalize(Vec::new(), Some("hi".into()), Vec::new(), Some(ChatMode::Default));
        msg.append_delta(" world");
        assert_eq!(msg.content(), "Hello", "finalized content is immutable");
        assert!(msg.is_finalized());
        assert_eq!(msg.original_query(), Some("hi"));
    }

    #[test]
    fn retry_version_never_mutates_original() {
        let mut msg = ConversationMessage::assistant_placeholder();
        msg.append_delta("first answer");
        msg.finalize(Vec::new(), None, Vec::new(), None);

        msg.push_retry_version(RetryVersion::new("second answer", Vec::new()));
        assert_eq!(msg.content(), "first answer");
        assert_eq!(msg.displayed_content(), "second answer");
        assert_eq!(msg.current_retry_index(), 1);
        assert_eq!(msg.retry_versions().len(), 1);
    }

    #[test]
    fn version_selection_bounds() {
        let mut msg = ConversationMessage::assistant_placeholder();
        msg.push_retry_version(RetryVersion::new("v1", Vec::new()));

        assert!(msg.select_version(0).is_ok());
        assert_eq!(msg.displayed_content(), "");
        assert!(msg.select_version(1).is_ok());
        assert_eq!(msg.displayed_content(), "v1");
        assert!(msg.select_version(2).is_err());
    }

    #[test]
    fn displayed_citations_follow_version() {
        let mut msg = ConversationMessage::assistant_placeholder();
        msg.append_delta("original");
        msg.finalize(
            vec![Citation::new("Original Source", "https://a.example")],
            None,
            Vec::new(),
            None,
        );
        msg.push_retry_version(RetryVersion::new(
            "alternate",
            vec![Citation::new("Alt Source", "https://b.example")],
        ));

        assert_eq!(msg.displayed_citations()[0].title, "Alt Source");
        msg.select_version(0).unwrap();
        assert_eq!(msg.displayed_citations()[0].title, "Original Source");
    }

    #[test]
    fn image_payload_round_trips() {
        let payload = ImagePayload::from_bytes(b"fake image bytes", "image/jpeg");
        assert_eq!(payload.decode().unwrap(), b"fake image bytes");
        assert_eq!(payload.media_type, "image/jpeg");
    }

    #[test]
    fn image_payload_rejects_bad_base64() {
        let payload = ImagePayload::new("not base64!!!", "image/png");
        assert!(payload.decode().is_err());
    }

    #[test]
    fn apply_image_result_finalizes() {
        let mut msg = ConversationMessage::assistant_placeholder();
        msg.apply_image_result(
            GeneratedImage {
                content: "A sunset".into(),
                images: vec![ImagePayload::from_bytes(b"img", "image/png")],
            },
            Some("draw a sunset".into()),
        );

        assert!(msg.is_finalized());
        assert_eq!(msg.content(), "A sunset");
        assert_eq!(msg.images().len(), 1);
        assert_eq!(msg.original_mode(), Some(ChatMode::Image));
    }

    #[test]
    fn chat_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ChatMode::Search).unwrap(), "\"search\"");
        assert_eq!(serde_json::to_string(&ChatMode::Image).unwrap(), "\"image\"");
    }

    #[test]
    fn text_mode_classification() {
        assert!(ChatMode::Default.is_text());
        assert!(ChatMode::Search.is_text());
        assert!(ChatMode::Auto.is_text());
        assert!(!ChatMode::Image.is_text());
    }
}
