//! Axum routes for conversation endpoints.

use axum::routing::get;
use axum::Router;

use super::super::state::AppState;
use super::handlers::{
    create_conversation, delete_conversation, get_conversation, list_conversations,
    update_conversation,
};

/// Creates routes for conversation endpoints.
///
/// - POST /conversations - create a conversation
/// - GET /conversations - list conversations (optionally archived)
/// - GET /conversations/:id - conversation with full history
/// - PATCH /conversations/:id - rename / move to folder / archive
/// - DELETE /conversations/:id - delete with messages
pub fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/conversations/:id",
            get(get_conversation)
                .patch(update_conversation)
                .delete(delete_conversation),
        )
}
