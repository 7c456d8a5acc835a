//! HTTP handlers for the AI proxy surface.
//!
//! The chat and regenerate endpoints bridge the application handlers to
//! SSE: deltas are forwarded frame by frame as they arrive, and the
//! terminal `done`/`error` frame is emitted from the handler's result.
//! Client disconnects cancel the in-flight stream through a token guard;
//! partial content persisted up to that point is kept.

use std::convert::Infallible;
use std::future::Future;

use axum::extract::{Json, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};
use uuid::Uuid;

use crate::application::{
    RegenerateResponseCommand, RegenerateResponseError, RegenerateResponseHandler,
    SendMessageCommand, SendMessageError, SendMessageHandler,
};
use crate::domain::conversation::{SendError, StreamEvent, MAX_ATTACHED_IMAGES};
use crate::domain::foundation::{ConversationId, MessageId};
use crate::ports::{ImageError, SpeechError, TranscriptionError};

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::state::AppState;
use super::dto::{
    ChatStreamRequest, EditImageRequest, GenerateImageRequest, ImageResponse, RegenerateRequest,
    SpeechRequest, TranscriptionResponse, WireFrame,
};

/// Forwarding channel depth between the stream driver and the SSE edge.
const FRAME_BUFFER: usize = 32;

/// POST /api/chat - streamed chat completion.
///
/// Responds with an SSE stream of wire frames. Failures after the stream
/// has opened arrive in-band as an `error` frame.
pub async fn chat_stream(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<ChatStreamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.query.trim().is_empty() && request.images.is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }
    if request.images.len() > MAX_ATTACHED_IMAGES {
        return Err(ApiError::bad_request(format!(
            "at most {} images may be attached",
            MAX_ATTACHED_IMAGES
        )));
    }
    if !request.mode.is_text() {
        return Err(ApiError::bad_request(
            "image mode does not stream; use /api/images",
        ));
    }

    let handler = SendMessageHandler::new(state.conversations.clone(), state.chat.clone());
    let cmd = SendMessageCommand {
        user_id: user.user_id,
        conversation_id: request.conversation_id.map(ConversationId::from_uuid),
        query: request.query,
        images: request.images,
        mode: request.mode,
    };

    Ok(streaming_response(move |frames, cancel| async move {
        handler
            .handle(cmd, frames, &cancel)
            .await
            .err()
            .map(send_failure_message)
    }))
}

/// POST /api/conversations/:id/messages/:message_id/regenerate
///
/// Streams the alternate completion in the same wire format as `/api/chat`.
/// A retry with nothing to resubmit closes immediately with a `done` frame.
pub async fn regenerate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((conversation_id, message_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RegenerateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = RegenerateResponseHandler::new(state.conversations.clone(), state.chat.clone());
    let cmd = RegenerateResponseCommand {
        user_id: user.user_id,
        conversation_id: ConversationId::from_uuid(conversation_id),
        message_id: MessageId::from_uuid(message_id),
        flavor: request.flavor.into(),
    };

    Ok(streaming_response(move |frames, cancel| async move {
        handler
            .handle(cmd, frames, &cancel)
            .await
            .err()
            .map(regenerate_failure_message)
    }))
}

/// POST /api/images - single-shot image generation.
pub async fn generate_image(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(request): Json<GenerateImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .images
        .generate(&request.prompt)
        .await
        .map_err(map_image_error)?;
    Ok(Json(ImageResponse::from(image)))
}

/// POST /api/images/edit - edit/remix with reference images.
pub async fn edit_image(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(request): Json<EditImageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let image = state
        .images
        .edit(&request.prompt, &request.references)
        .await
        .map_err(map_image_error)?;
    Ok(Json(ImageResponse::from(image)))
}

/// POST /api/transcriptions - multipart audio upload, transcribed text out.
pub async fn transcribe(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?
    {
        if field.name() == Some("file") {
            let media_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let audio = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.to_string()))?;
            let text = state
                .transcriber
                .transcribe(audio, &media_type)
                .await
                .map_err(map_transcription_error)?;
            return Ok(Json(TranscriptionResponse { text }));
        }
    }
    Err(ApiError::bad_request("missing multipart field \"file\""))
}

/// POST /api/speech - text in, audio bytes out.
pub async fn synthesize_speech(
    State(state): State<AppState>,
    RequireAuth(_user): RequireAuth,
    Json(request): Json<SpeechRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let audio = state
        .speech
        .synthesize(&request.text)
        .await
        .map_err(map_speech_error)?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

/// Spawns `run` with a forwarding channel and a cancellation token, and
/// returns the SSE response reading from that channel.
///
/// `run` resolves to `None` on success and `Some(message)` on failure; the
/// matching terminal frame is appended after the forwarded frames. Dropping
/// the response (client disconnect) cancels the token.
fn streaming_response<F, Fut>(run: F) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: FnOnce(mpsc::Sender<StreamEvent>, CancellationToken) -> Fut,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(FRAME_BUFFER);
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let fut = run(tx.clone(), cancel);
    tokio::spawn(async move {
        let terminal = match fut.await {
            None => StreamEvent::Done,
            Some(message) => StreamEvent::Error(message),
        };
        let _ = tx.send(terminal).await;
    });

    Sse::new(frame_stream(rx, guard)).keep_alive(KeepAlive::default())
}

/// Adapts the forwarded event channel into SSE events, holding the cancel
/// guard for the lifetime of the response body.
fn frame_stream(
    rx: mpsc::Receiver<StreamEvent>,
    guard: DropGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        let sse = Event::default().json_data(WireFrame::from(event)).ok()?;
        Some((Ok(sse), (rx, guard)))
    })
}

/// Client-safe message for a failed send; internals are logged, not leaked.
fn send_failure_message(err: SendMessageError) -> String {
    match err {
        SendMessageError::Validation(e) => e.to_string(),
        SendMessageError::ConversationNotFound => "conversation not found".to_string(),
        SendMessageError::Stream(SendError::Upstream(message)) => message,
        SendMessageError::Domain(e) => {
            tracing::error!(error = %e, "send failed during persistence");
            "internal error".to_string()
        }
        SendMessageError::Stream(e) => {
            tracing::error!(error = %e, "chat stream failed");
            "AI provider request failed".to_string()
        }
    }
}

/// Client-safe message for a failed regeneration.
fn regenerate_failure_message(err: RegenerateResponseError) -> String {
    match err {
        RegenerateResponseError::ConversationNotFound => "conversation not found".to_string(),
        RegenerateResponseError::MessageNotFound => "message not found".to_string(),
        RegenerateResponseError::Validation(e) => e.to_string(),
        RegenerateResponseError::Stream(SendError::Upstream(message)) => message,
        RegenerateResponseError::Domain(e) => {
            tracing::error!(error = %e, "regenerate failed during persistence");
            "internal error".to_string()
        }
        RegenerateResponseError::Stream(e) => {
            tracing::error!(error = %e, "regenerate stream failed");
            "AI provider request failed".to_string()
        }
    }
}

fn map_image_error(err: ImageError) -> ApiError {
    match err {
        ImageError::Rejected(message) | ImageError::InvalidRequest(message) => {
            ApiError::bad_request(message)
        }
        ImageError::BudgetExhausted => ApiError::new(
            StatusCode::BAD_GATEWAY,
            "UPSTREAM_ERROR",
            "image generation capacity exhausted",
        ),
        other => {
            tracing::error!(error = %other, "image provider failure");
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "image provider request failed",
            )
        }
    }
}

fn map_transcription_error(err: TranscriptionError) -> ApiError {
    match err {
        TranscriptionError::Rejected(message) => ApiError::bad_request(message),
        other => {
            tracing::error!(error = %other, "transcription provider failure");
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "transcription request failed",
            )
        }
    }
}

fn map_speech_error(err: SpeechError) -> ApiError {
    match err {
        SpeechError::Rejected(message) => ApiError::bad_request(message),
        other => {
            tracing::error!(error = %other, "speech provider failure");
            ApiError::new(
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_ERROR",
                "speech synthesis request failed",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ValidationError;
    use futures::StreamExt;

    #[tokio::test]
    async fn frame_stream_emits_forwarded_then_terminal() {
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        tx.send(StreamEvent::Content("Hel".into())).await.unwrap();
        tx.send(StreamEvent::Done).await.unwrap();
        drop(tx);

        let collected: Vec<_> = frame_stream(rx, cancel.clone().drop_guard())
            .collect()
            .await;
        assert_eq!(collected.len(), 2);
        assert!(cancel.is_cancelled(), "guard released after stream end");
    }

    #[tokio::test]
    async fn dropping_the_stream_cancels_the_token() {
        let (_tx, rx) = mpsc::channel::<StreamEvent>(8);
        let cancel = CancellationToken::new();
        let stream = frame_stream(rx, cancel.clone().drop_guard());

        assert!(!cancel.is_cancelled());
        drop(stream);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn upstream_error_message_passes_through() {
        let message = send_failure_message(SendMessageError::Stream(SendError::Upstream(
            "model overloaded".into(),
        )));
        assert_eq!(message, "model overloaded");
    }

    #[test]
    fn database_details_never_reach_the_wire() {
        let message = send_failure_message(SendMessageError::Domain(
            crate::domain::foundation::DomainError::database("password for 10.0.0.3 rejected"),
        ));
        assert_eq!(message, "internal error");
    }

    #[test]
    fn validation_messages_are_forwarded() {
        let message = send_failure_message(SendMessageError::Validation(
            ValidationError::empty_field("query"),
        ));
        assert!(message.contains("query"));
    }
}
