//! HTTP adapter - axum routers, handlers, middleware, and error mapping.
//!
//! All API routes hang under `/api` behind the JWT auth middleware; the
//! `RequireAuth` extractor enforces authentication per handler so the one
//! public route (share resolution) can share the router. CRUD routes carry
//! a request timeout; the streaming and provider-proxy routes do not.

pub mod ai_proxy;
pub mod conversation;
pub mod engagement;
pub mod error;
pub mod folder;
pub mod middleware;
pub mod share;
pub mod state;

pub use state::AppState;

use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

/// Timeout for non-streaming routes.
const CRUD_TIMEOUT: Duration = Duration::from_secs(30);

/// Assembles the full application router.
pub fn app_router(state: AppState, server: &ServerConfig) -> Router {
    let auth_state: middleware::AuthState = state.token_verifier.clone();

    let crud = Router::new()
        .merge(conversation::conversation_routes())
        .merge(folder::folder_routes())
        .merge(engagement::engagement_routes())
        .merge(share::share_routes())
        .layer(TimeoutLayer::new(CRUD_TIMEOUT));

    let api = Router::new()
        .merge(crud)
        .merge(ai_proxy::ai_proxy_routes())
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
}

async fn health() -> &'static str {
    "ok"
}

/// Builds the CORS layer from configured origins; an empty list means any
/// origin (development default).
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
