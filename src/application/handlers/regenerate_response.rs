//! RegenerateResponse command handler.
//!
//! Re-issues the inputs that produced an assistant turn, flavored by the
//! caller's [`RetryFlavor`], and drives the controller's retry path. The
//! alternate completion lives in session state as a retry version; it is
//! persisted only when the retry's target could not be resolved and the
//! content had to be appended as a brand-new assistant turn.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::conversation::{
    derive_retry_prompt, Citation, Role, RetryFlavor, SendError, SendInput, StreamEvent,
    StreamingConversationController,
};
use crate::domain::foundation::{ConversationId, DomainError, MessageId, UserId, ValidationError};
use crate::domain::library::StoredMessage;
use crate::ports::{ChatRequest, ChatStreamClient, ConversationRepository, ProviderMessage};

use super::{history_from_messages, session_from_messages, tee_events};

/// Command to regenerate a persisted assistant turn.
#[derive(Debug, Clone)]
pub struct RegenerateResponseCommand {
    pub user_id: UserId,
    pub conversation_id: ConversationId,
    /// The persisted assistant message to regenerate.
    pub message_id: MessageId,
    pub flavor: RetryFlavor,
}

/// Errors surfaced by [`RegenerateResponseHandler::handle`].
#[derive(Debug, Error)]
pub enum RegenerateResponseError {
    /// The conversation does not exist for this user.
    #[error("conversation not found")]
    ConversationNotFound,

    /// The target message does not exist in the conversation.
    #[error("message not found")]
    MessageNotFound,

    /// The derived prompt cannot be streamed (image-mode original).
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persistence failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The stream failed while (or before) running.
    #[error(transparent)]
    Stream(#[from] SendError),
}

/// Result of a completed (or cancelled) regeneration.
#[derive(Debug, Clone)]
pub struct RegenerateResult {
    pub content: String,
    pub citations: Vec<Citation>,
    pub cancelled: bool,
    /// Persisted id of a freshly appended assistant turn, set only when the
    /// retry could not attach to its target.
    pub appended_message_id: Option<MessageId>,
}

/// Handler for [`RegenerateResponseCommand`].
pub struct RegenerateResponseHandler {
    conversations: Arc<dyn ConversationRepository>,
    chat: Arc<dyn ChatStreamClient>,
}

impl RegenerateResponseHandler {
    /// Creates a handler over the given ports.
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        chat: Arc<dyn ChatStreamClient>,
    ) -> Self {
        Self {
            conversations,
            chat,
        }
    }

    /// Handles one regeneration cycle.
    ///
    /// Returns `Ok(None)` when the retry is a no-op (no query and no images
    /// could be derived); no request is issued in that case. Deltas are
    /// forwarded through `forward` as in [`SendMessageHandler::handle`].
    ///
    /// [`SendMessageHandler::handle`]: super::SendMessageHandler::handle
    pub async fn handle(
        &self,
        cmd: RegenerateResponseCommand,
        forward: mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<Option<RegenerateResult>, RegenerateResponseError> {
        self.conversations
            .find(cmd.conversation_id, &cmd.user_id)
            .await?
            .ok_or(RegenerateResponseError::ConversationNotFound)?;

        let stored = self
            .conversations
            .messages(cmd.conversation_id, &cmd.user_id)
            .await?;

        // The session mirrors the stored list one to one, so the stored
        // position doubles as the session index.
        let index = stored
            .iter()
            .position(|m| m.id == cmd.message_id)
            .ok_or(RegenerateResponseError::MessageNotFound)?;

        let mut session = session_from_messages(&stored);
        session.bind(cmd.conversation_id);
        let mut controller = StreamingConversationController::with_session(session);

        let Some(prompt) = derive_retry_prompt(controller.session(), index) else {
            return Ok(None);
        };
        let prompt = cmd.flavor.apply(prompt);
        if !prompt.mode.is_text() {
            return Err(ValidationError::invalid_format(
                "mode",
                "image turns are regenerated through the image endpoint",
            )
            .into());
        }

        // Context ends just before the target; a trailing user turn is the
        // one being re-asked, so it is replaced by the flavored query.
        let mut context = &stored[..index];
        if let Some((last, rest)) = context.split_last() {
            if last.role == Role::User {
                context = rest;
            }
        }
        let mut request = ChatRequest::new(prompt.mode);
        for turn in history_from_messages(context) {
            request = request.with_message(turn);
        }
        let request = request.with_message(ProviderMessage::user(prompt.query.clone()));

        let events = self
            .chat
            .stream_chat(request)
            .await
            .map_err(SendError::from)?;
        let events = tee_events(events, forward);

        let outcome = controller
            .send(
                SendInput::new(prompt.query, prompt.mode)
                    .with_images(prompt.images)
                    .retrying(index),
                events,
                cancel,
            )
            .await?;

        // Retry versions stay in session state; only the fallback path
        // creates a durable message.
        let appended_message_id = if outcome.appended_as_new {
            let assistant = StoredMessage::assistant(
                cmd.conversation_id,
                outcome.content.clone(),
                Vec::new(),
                outcome.citations.clone(),
                prompt.mode,
            );
            self.conversations.append_message(&assistant).await?;
            Some(assistant.id)
        } else {
            None
        };

        Ok(Some(RegenerateResult {
            content: outcome.content,
            citations: outcome.citations,
            cancelled: outcome.cancelled,
            appended_message_id,
        }))
    }
}
