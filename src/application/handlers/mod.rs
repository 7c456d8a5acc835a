//! Command handlers.

mod regenerate_response;
mod send_message;

pub use regenerate_response::{
    RegenerateResponseCommand, RegenerateResponseError, RegenerateResponseHandler, RegenerateResult,
};
pub use send_message::{SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult};

use futures::StreamExt;
use tokio::sync::mpsc;

use crate::domain::conversation::{ConversationMessage, ConversationSession, Role, StreamEvent};
use crate::domain::library::StoredMessage;
use crate::ports::ProviderMessage;

/// Wraps a provider stream so each delta and citation set is mirrored to
/// `forward` before the controller consumes it. Terminal and error frames
/// are not mirrored; the caller emits those from the final result.
pub(crate) fn tee_events<S, E>(
    events: S,
    forward: mpsc::Sender<StreamEvent>,
) -> impl futures::Stream<Item = Result<StreamEvent, E>>
where
    S: futures::Stream<Item = Result<StreamEvent, E>>,
{
    events.then(move |item| {
        let forward = forward.clone();
        async move {
            if let Ok(event @ (StreamEvent::Content(_) | StreamEvent::Citations(_))) = &item {
                // Receiver gone means the client went away; the cancel
                // token handles teardown.
                let _ = forward.send(event.clone()).await;
            }
            item
        }
    })
}

/// Rebuilds an in-memory session mirroring persisted history, one session
/// message per stored message in creation order.
pub(crate) fn session_from_messages(stored: &[StoredMessage]) -> ConversationSession {
    let mut session = ConversationSession::new();
    for message in stored {
        match message.role {
            Role::User => {
                match ConversationMessage::user(&message.content, message.images.clone()) {
                    Ok(turn) => {
                        session.push(turn);
                    }
                    // Persisted user turns are validated on write; an
                    // unrestorable one indicates corrupt data, not a bug here.
                    Err(e) => tracing::warn!(error = %e, "skipping unrestorable user turn"),
                }
            }
            Role::Assistant => {
                session.push(ConversationMessage::assistant_finalized(
                    &message.content,
                    message.citations.clone(),
                    None,
                    Vec::new(),
                    message.mode,
                ));
            }
        }
    }
    session
}

/// Projects persisted messages into provider turns, oldest first.
pub(crate) fn history_from_messages(stored: &[StoredMessage]) -> Vec<ProviderMessage> {
    stored
        .iter()
        .map(|m| match m.role {
            Role::User => ProviderMessage::user(&m.content),
            Role::Assistant => ProviderMessage::assistant(&m.content),
        })
        .collect()
}
