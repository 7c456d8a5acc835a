//! SendMessage command handler.
//!
//! Resolves (or creates) the target conversation, opens a provider stream,
//! drives it through the [`StreamingConversationController`], forwards
//! deltas to the caller as they arrive, and persists the user turn and the
//! finalized assistant turn. Partial content produced before a cancel is
//! persisted too; a transport failure or in-band provider error leaves the
//! user turn persisted and the assistant turn absent.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::conversation::{
    ChatMode, Citation, ImagePayload, SendError, SendInput, StreamEvent,
    StreamingConversationController, MAX_ATTACHED_IMAGES,
};
use crate::domain::foundation::{ConversationId, DomainError, MessageId, UserId, ValidationError};
use crate::domain::library::{derive_title, ConversationRecord, StoredMessage};
use crate::ports::{ChatRequest, ChatStreamClient, ConversationRepository, ProviderMessage};

use super::{history_from_messages, session_from_messages, tee_events};

/// Command to send a user message and stream the assistant response.
#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub user_id: UserId,
    /// Existing conversation to continue; `None` starts a new one titled
    /// after the query.
    pub conversation_id: Option<ConversationId>,
    pub query: String,
    pub images: Vec<ImagePayload>,
    pub mode: ChatMode,
}

/// Errors surfaced by [`SendMessageHandler::handle`].
#[derive(Debug, Error)]
pub enum SendMessageError {
    /// Input rejected before any persistence or network activity.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The target conversation does not exist for this user.
    #[error("conversation not found")]
    ConversationNotFound,

    /// Persistence failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The stream failed while (or before) running.
    #[error(transparent)]
    Stream(#[from] SendError),
}

/// Result of a completed (or cancelled) send.
#[derive(Debug, Clone)]
pub struct SendMessageResult {
    pub conversation_id: ConversationId,
    /// True when this send created the conversation.
    pub conversation_created: bool,
    pub title: String,
    pub user_message_id: MessageId,
    /// Persisted assistant message; `None` when the stream was cancelled
    /// before producing anything.
    pub assistant_message_id: Option<MessageId>,
    pub content: String,
    pub citations: Vec<Citation>,
    pub cancelled: bool,
}

/// Handler for [`SendMessageCommand`].
pub struct SendMessageHandler {
    conversations: Arc<dyn ConversationRepository>,
    chat: Arc<dyn ChatStreamClient>,
}

impl SendMessageHandler {
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

    /// Handles one send cycle end to end.
    ///
    /// `Content` and `Citations` events are forwarded through `forward` as
    /// they arrive; terminal framing is the caller's responsibility, driven
    /// by the returned result. A dropped receiver does not abort the
    /// stream - cancel the token for that.
    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
        forward: mpsc::Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<SendMessageResult, SendMessageError> {
        if !cmd.mode.is_text() {
            return Err(ValidationError::invalid_format(
                "mode",
                "image mode does not stream text",
            )
            .into());
        }
        if cmd.query.trim().is_empty() && cmd.images.is_empty() {
            return Err(ValidationError::empty_field("query").into());
        }
        if cmd.images.len() > MAX_ATTACHED_IMAGES {
            return Err(ValidationError::too_many_items(
                "images",
                MAX_ATTACHED_IMAGES,
                cmd.images.len(),
            )
            .into());
        }

        let (conversation, conversation_created) = match cmd.conversation_id {
            Some(id) => {
                let record = self
                    .conversations
                    .find(id, &cmd.user_id)
                    .await?
                    .ok_or(SendMessageError::ConversationNotFound)?;
                (record, false)
            }
            None => {
                let record =
                    ConversationRecord::new(cmd.user_id.clone(), derive_title(&cmd.query))?;
                self.conversations.create(&record).await?;
                (record, true)
            }
        };

        let stored = self
            .conversations
            .messages(conversation.id, &cmd.user_id)
            .await?;

        let mut session = session_from_messages(&stored);
        session.bind(conversation.id);
        let mut controller = StreamingConversationController::with_session(session);

        let mut request = ChatRequest::new(cmd.mode);
        for turn in history_from_messages(&stored) {
            request = request.with_message(turn);
        }
        let request = request.with_message(ProviderMessage::user(cmd.query.clone()));

        // Persisted before the stream opens so the turn survives a
        // transport failure.
        let user_message =
            StoredMessage::user(conversation.id, cmd.query.clone(), cmd.images.clone());
        self.conversations.append_message(&user_message).await?;

        let events = self
            .chat
            .stream_chat(request)
            .await
            .map_err(SendError::from)?;
        let events = tee_events(events, forward);

        let outcome = controller
            .send(
                SendInput::new(cmd.query, cmd.mode).with_images(cmd.images),
                events,
                cancel,
            )
            .await?;

        // Cancel-with-partial still lands a persisted assistant turn;
        // cancel-before-anything leaves only the user turn behind.
        let assistant_message_id = match outcome.message_id {
            Some(_) => {
                let assistant = StoredMessage::assistant(
                    conversation.id,
                    outcome.content.clone(),
                    Vec::new(),
                    outcome.citations.clone(),
                    cmd.mode,
                );
                self.conversations.append_message(&assistant).await?;
                Some(assistant.id)
            }
            None => None,
        };

        Ok(SendMessageResult {
            conversation_id: conversation.id,
            conversation_created,
            title: conversation.title,
            user_message_id: user_message.id,
            assistant_message_id,
            content: outcome.content,
            citations: outcome.citations,
            cancelled: outcome.cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{Role, StreamTransportError};
    use crate::ports::EventStream;
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;

    struct MockRepo {
        conversations: Mutex<Vec<ConversationRecord>>,
        messages: Mutex<Vec<StoredMessage>>,
    }

    impl MockRepo {
        fn new() -> Self {
            Self {
                conversations: Mutex::new(Vec::new()),
                messages: Mutex::new(Vec::new()),
            }
        }

        fn with_conversation(record: ConversationRecord) -> Self {
            Self {
                conversations: Mutex::new(vec![record]),
                messages: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConversationRepository for MockRepo {
        async fn create(&self, record: &ConversationRecord) -> Result<(), DomainError> {
            self.conversations.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn find(
            &self,
            id: ConversationId,
            user: &UserId,
        ) -> Result<Option<ConversationRecord>, DomainError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id && &c.user_id == user)
                .cloned())
        }

        async fn list(
            &self,
            user: &UserId,
            _include_archived: bool,
        ) -> Result<Vec<ConversationRecord>, DomainError> {
            Ok(self
                .conversations
                .lock()
                .unwrap()
                .iter()
                .filter(|c| &c.user_id == user)
                .cloned()
                .collect())
        }

        async fn update(&self, record: &ConversationRecord) -> Result<(), DomainError> {
            let mut conversations = self.conversations.lock().unwrap();
            if let Some(c) = conversations.iter_mut().find(|c| c.id == record.id) {
                *c = record.clone();
            }
            Ok(())
        }

        async fn delete(&self, id: ConversationId, _user: &UserId) -> Result<(), DomainError> {
            self.conversations.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }

        async fn append_message(&self, message: &StoredMessage) -> Result<(), DomainError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn messages(
            &self,
            id: ConversationId,
            _user: &UserId,
        ) -> Result<Vec<StoredMessage>, DomainError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.conversation_id == id)
                .cloned()
                .collect())
        }
    }

    struct ScriptedChat {
        script: Mutex<Vec<Result<StreamEvent, StreamTransportError>>>,
    }

    impl ScriptedChat {
        fn new(script: Vec<Result<StreamEvent, StreamTransportError>>) -> Self {
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl ChatStreamClient for ScriptedChat {
        async fn stream_chat(
            &self,
            _request: ChatRequest,
        ) -> Result<EventStream, StreamTransportError> {
            let script = std::mem::take(&mut *self.script.lock().unwrap());
            Ok(Box::pin(stream::iter(script)))
        }
    }

    fn user() -> UserId {
        UserId::new("user-1").unwrap()
    }

    fn handler(
        repo: Arc<MockRepo>,
        script: Vec<Result<StreamEvent, StreamTransportError>>,
    ) -> SendMessageHandler {
        SendMessageHandler::new(repo, Arc::new(ScriptedChat::new(script)))
    }

    fn cmd(query: &str) -> SendMessageCommand {
        SendMessageCommand {
            user_id: user(),
            conversation_id: None,
            query: query.to_string(),
            images: Vec::new(),
            mode: ChatMode::Default,
        }
    }

    #[tokio::test]
    async fn creates_conversation_and_persists_both_turns() {
        let repo = Arc::new(MockRepo::new());
        let handler = handler(
            repo.clone(),
            vec![
                Ok(StreamEvent::Content("Hel".into())),
                Ok(StreamEvent::Content("lo".into())),
                Ok(StreamEvent::Done),
            ],
        );
        let (tx, mut rx) = mpsc::channel(8);

        let result = handler
            .handle(cmd("say hello"), tx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(result.conversation_created);
        assert_eq!(result.title, "say hello");
        assert_eq!(result.content, "Hello");
        assert!(result.assistant_message_id.is_some());

        let messages = repo.messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hello");
        drop(messages);

        // Deltas were mirrored in order.
        assert_eq!(rx.recv().await, Some(StreamEvent::Content("Hel".into())));
        assert_eq!(rx.recv().await, Some(StreamEvent::Content("lo".into())));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn continues_existing_conversation_with_history() {
        let record = ConversationRecord::new(user(), "Ongoing").unwrap();
        let id = record.id;
        let repo = Arc::new(MockRepo::with_conversation(record));
        repo.append_message(&StoredMessage::user(id, "earlier question", Vec::new()))
            .await
            .unwrap();
        repo.append_message(&StoredMessage::assistant(
            id,
            "earlier answer",
            Vec::new(),
            Vec::new(),
            ChatMode::Default,
        ))
        .await
        .unwrap();

        let handler = handler(
            repo.clone(),
            vec![Ok(StreamEvent::Content("next".into())), Ok(StreamEvent::Done)],
        );
        let (tx, _rx) = mpsc::channel(8);

        let mut command = cmd("follow-up");
        command.conversation_id = Some(id);
        let result = handler
            .handle(command, tx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(!result.conversation_created);
        assert_eq!(result.conversation_id, id);
        assert_eq!(repo.messages.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unknown_conversation_is_rejected() {
        let repo = Arc::new(MockRepo::new());
        let handler = handler(repo, vec![Ok(StreamEvent::Done)]);
        let (tx, _rx) = mpsc::channel(8);

        let mut command = cmd("hello");
        command.conversation_id = Some(ConversationId::new());
        let err = handler
            .handle(command, tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SendMessageError::ConversationNotFound));
    }

    #[tokio::test]
    async fn empty_query_persists_nothing() {
        let repo = Arc::new(MockRepo::new());
        let handler = handler(repo.clone(), vec![Ok(StreamEvent::Done)]);
        let (tx, _rx) = mpsc::channel(8);

        let err = handler
            .handle(cmd("   "), tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SendMessageError::Validation(_)));
        assert!(repo.conversations.lock().unwrap().is_empty());
        assert!(repo.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_error_keeps_user_turn_only() {
        let repo = Arc::new(MockRepo::new());
        let handler = handler(
            repo.clone(),
            vec![
                Ok(StreamEvent::Content("partial".into())),
                Ok(StreamEvent::Error("model overloaded".into())),
            ],
        );
        let (tx, _rx) = mpsc::channel(8);

        let err = handler
            .handle(cmd("hello"), tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SendMessageError::Stream(SendError::Upstream(_))));
        let messages = repo.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[tokio::test]
    async fn image_mode_is_rejected() {
        let repo = Arc::new(MockRepo::new());
        let handler = handler(repo, vec![]);
        let (tx, _rx) = mpsc::channel(8);

        let mut command = cmd("draw a cat");
        command.mode = ChatMode::Image;
        let err = handler
            .handle(command, tx, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, SendMessageError::Validation(_)));
    }
}
