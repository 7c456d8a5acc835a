//! Axum routes for share endpoints.

use axum::routing::get;
use axum::Router;

use super::super::state::AppState;
use super::handlers::{create_share, list_shares, resolve_share, revoke_share};

/// Creates routes for share endpoints.
///
/// GET /shares/:token is public; everything else requires auth via the
/// `RequireAuth` extractor.
pub fn share_routes() -> Router<AppState> {
    Router::new()
        .route("/shares", get(list_shares).post(create_share))
        .route("/shares/:token", get(resolve_share).delete(revoke_share))
}
