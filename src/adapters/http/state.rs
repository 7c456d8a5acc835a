//! Shared application state for the HTTP layer.

use std::sync::Arc;

use crate::ports::{
    ChatStreamClient, ConversationRepository, EngagementRepository, FolderRepository,
    ImageGenerator, ShareRepository, SpeechSynthesizer, TokenVerifier, Transcriber,
};

/// Shared application state containing all dependencies.
///
/// Cloned per request; every dependency is Arc-wrapped and addressed
/// through its port so adapters can be swapped or mocked.
#[derive(Clone)]
pub struct AppState {
    pub conversations: Arc<dyn ConversationRepository>,
    pub folders: Arc<dyn FolderRepository>,
    pub engagement: Arc<dyn EngagementRepository>,
    pub shares: Arc<dyn ShareRepository>,
    pub chat: Arc<dyn ChatStreamClient>,
    pub images: Arc<dyn ImageGenerator>,
    pub transcriber: Arc<dyn Transcriber>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub token_verifier: Arc<dyn TokenVerifier>,
}
