//! HTTP handlers for share endpoints.
//!
//! The resolve route is public: holding the token is the authorization.
//! Fetches for a resolved share run scoped to the share's owner, so the
//! snapshot is exactly what the owner could see.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::domain::foundation::{ConversationId, ShareToken};
use crate::domain::library::Share;

use super::super::conversation::dto::MessageResponse;
use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::state::AppState;
use super::dto::{CreateShareRequest, ShareResponse, SharedConversationResponse};

/// POST /api/shares
pub async fn create_share(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateShareRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation_id = ConversationId::from_uuid(request.conversation_id);

    // Only the owner may share a conversation.
    state
        .conversations
        .find(conversation_id, &user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    let share = Share::new(conversation_id, user.user_id);
    state.shares.create(&share).await?;

    Ok((StatusCode::CREATED, Json(ShareResponse::from(&share))))
}

/// GET /api/shares
pub async fn list_shares(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let shares = state.shares.list(&user.user_id).await?;
    let response: Vec<ShareResponse> = shares.iter().map(ShareResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/shares/:token - public, no authentication.
pub async fn resolve_share(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let token = ShareToken::new(token).map_err(|_| ApiError::not_found("Share not found"))?;

    let share = state
        .shares
        .resolve(&token)
        .await?
        .ok_or_else(|| ApiError::not_found("Share not found"))?;

    let conversation = state
        .conversations
        .find(share.conversation_id, &share.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Share not found"))?;
    let messages = state
        .conversations
        .messages(share.conversation_id, &share.user_id)
        .await?;

    Ok(Json(SharedConversationResponse {
        title: conversation.title,
        messages: messages.iter().map(MessageResponse::from).collect(),
        shared_at: share.created_at.to_string(),
    }))
}

/// DELETE /api/shares/:token
pub async fn revoke_share(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let token = ShareToken::new(token).map_err(|_| ApiError::not_found("Share not found"))?;
    state.shares.revoke(&token, &user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
