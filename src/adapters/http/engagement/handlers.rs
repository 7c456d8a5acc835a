//! HTTP handlers for vote and feedback endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, MessageId};
use crate::domain::library::{Feedback, Vote};

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::state::AppState;
use super::dto::{CastVoteRequest, FeedbackResponse, SubmitFeedbackRequest, VoteResponse};

/// PUT /api/messages/:id/vote
///
/// Upsert semantics: voting again replaces the previous value.
pub async fn cast_vote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<CastVoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let vote = Vote::new(MessageId::from_uuid(id), user.user_id, request.value);
    state.engagement.upsert_vote(&vote).await?;
    Ok(Json(VoteResponse::from(&vote)))
}

/// DELETE /api/messages/:id/vote
pub async fn remove_vote(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engagement
        .remove_vote(MessageId::from_uuid(id), &user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/conversations/:id/votes
pub async fn conversation_votes(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let votes = state
        .engagement
        .votes_for_conversation(ConversationId::from_uuid(id), &user.user_id)
        .await?;
    let response: Vec<VoteResponse> = votes.iter().map(VoteResponse::from).collect();
    Ok(Json(response))
}

/// POST /api/feedback
pub async fn submit_feedback(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut feedback = Feedback::new(user.user_id, request.content)?;
    if let Some(conversation_id) = request.conversation_id {
        feedback = feedback.about_conversation(ConversationId::from_uuid(conversation_id));
    }
    if let Some(message_id) = request.message_id {
        feedback = feedback.about_message(MessageId::from_uuid(message_id));
    }

    state.engagement.record_feedback(&feedback).await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackResponse {
            id: *feedback.id.as_uuid(),
            created_at: feedback.created_at.to_string(),
        }),
    ))
}
