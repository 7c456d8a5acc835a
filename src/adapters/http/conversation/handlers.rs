//! HTTP handlers for conversation endpoints.

use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, FolderId};
use crate::domain::library::{derive_title, ConversationRecord};

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::state::AppState;
use super::dto::{
    ConversationDetailResponse, ConversationResponse, CreateConversationRequest,
    ListConversationsQuery, MessageResponse, UpdateConversationRequest,
};

/// POST /api/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = match request.title {
        Some(title) => title,
        None => derive_title(request.first_query.as_deref().unwrap_or_default()),
    };

    let mut record = ConversationRecord::new(user.user_id, title)?;
    if let Some(parent) = request.parent_conversation_id {
        record = record.with_parent(ConversationId::from_uuid(parent));
    }
    state.conversations.create(&record).await?;

    Ok((StatusCode::CREATED, Json(ConversationResponse::from(&record))))
}

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<ListConversationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state
        .conversations
        .list(&user.user_id, query.include_archived)
        .await?;

    let response: Vec<ConversationResponse> =
        records.iter().map(ConversationResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/conversations/:id
pub async fn get_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ConversationId::from_uuid(id);
    let record = state
        .conversations
        .find(id, &user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;
    let messages = state.conversations.messages(id, &user.user_id).await?;

    Ok(Json(ConversationDetailResponse {
        conversation: ConversationResponse::from(&record),
        messages: messages.iter().map(MessageResponse::from).collect(),
    }))
}

/// PATCH /api/conversations/:id
///
/// Applies any of rename, move-to-folder, archive/unarchive. A `null`
/// folder id moves the conversation out of its folder; a concrete folder
/// id must name a folder the caller owns.
pub async fn update_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateConversationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = ConversationId::from_uuid(id);
    let mut record = state
        .conversations
        .find(id, &user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    if let Some(title) = request.title {
        record.rename(title)?;
    }
    if let Some(folder_id) = request.folder_id {
        let folder_id = match folder_id {
            Some(raw) => {
                let folder_id = FolderId::from_uuid(raw);
                state
                    .folders
                    .find(folder_id, &user.user_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Folder not found"))?;
                Some(folder_id)
            }
            None => None,
        };
        record.move_to_folder(folder_id);
    }
    if let Some(archived) = request.is_archived {
        record.set_archived(archived);
    }

    state.conversations.update(&record).await?;
    Ok(Json(ConversationResponse::from(&record)))
}

/// DELETE /api/conversations/:id
pub async fn delete_conversation(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .conversations
        .delete(ConversationId::from_uuid(id), &user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
