//! HTTP handlers for folder endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::domain::foundation::FolderId;
use crate::domain::library::Folder;

use super::super::error::ApiError;
use super::super::middleware::RequireAuth;
use super::super::state::AppState;
use super::dto::{CreateFolderRequest, FolderResponse, RenameFolderRequest};

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CreateFolderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let folder = Folder::new(user.user_id, request.name)?;
    state.folders.create(&folder).await?;
    Ok((StatusCode::CREATED, Json(FolderResponse::from(&folder))))
}

/// GET /api/folders
pub async fn list_folders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let folders = state.folders.list(&user.user_id).await?;
    let response: Vec<FolderResponse> = folders.iter().map(FolderResponse::from).collect();
    Ok(Json(response))
}

/// PATCH /api/folders/:id
pub async fn rename_folder(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
    Json(request): Json<RenameFolderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut folder = state
        .folders
        .find(FolderId::from_uuid(id), &user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;

    folder.rename(request.name)?;
    state.folders.update(&folder).await?;
    Ok(Json(FolderResponse::from(&folder)))
}

/// DELETE /api/folders/:id
pub async fn delete_folder(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .folders
        .delete(FolderId::from_uuid(id), &user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
