//! Axum routes for vote and feedback endpoints.

use axum::routing::{get, post, put};
use axum::Router;

use super::super::state::AppState;
use super::handlers::{cast_vote, conversation_votes, remove_vote, submit_feedback};

/// Creates routes for vote and feedback endpoints.
pub fn engagement_routes() -> Router<AppState> {
    Router::new()
        .route("/messages/:id/vote", put(cast_vote).delete(remove_vote))
        .route("/conversations/:id/votes", get(conversation_votes))
        .route("/feedback", post(submit_feedback))
}
