//! Axum routes for folder endpoints.

use axum::routing::{get, patch};
use axum::Router;

use super::super::state::AppState;
use super::handlers::{create_folder, delete_folder, list_folders, rename_folder};

/// Creates routes for folder endpoints.
pub fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", get(list_folders).post(create_folder))
        .route("/folders/:id", patch(rename_folder).delete(delete_folder))
}
