//! Axum routes for the AI proxy endpoints.

use axum::routing::post;
use axum::Router;

use super::super::state::AppState;
use super::handlers::{
    chat_stream, edit_image, generate_image, regenerate, synthesize_speech, transcribe,
};

/// Creates routes for the AI proxy surface. All routes require auth.
pub fn ai_proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat_stream))
        .route(
            "/conversations/:id/messages/:message_id/regenerate",
            post(regenerate),
        )
        .route("/images", post(generate_image))
        .route("/images/edit", post(edit_image))
        .route("/transcriptions", post(transcribe))
        .route("/speech", post(synthesize_speech))
}
