//! Authentication middleware and extractor.
//!
//! `auth_middleware` validates the Bearer token through the
//! [`TokenVerifier`] port and injects the [`AuthenticatedUser`] into
//! request extensions; `RequireAuth` pulls it back out in handlers that
//! need it. Routes without a token pass through unauthenticated so the
//! public share route can live on the same router.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use super::super::error::ErrorResponse;
use crate::ports::{AuthError, AuthenticatedUser, TokenVerifier};

/// Auth middleware state - the token verifier port.
pub type AuthState = Arc<dyn TokenVerifier>;

/// Validates Bearer tokens and injects the authenticated user.
///
/// - Valid token: injects `AuthenticatedUser` into extensions.
/// - Invalid or expired token: 401 with a JSON body.
/// - No token: continues unauthenticated; `RequireAuth` rejects later
///   where authentication is mandatory.
pub async fn auth_middleware(
    State(verifier): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match token {
        Some(token) => match verifier.verify(token).await {
            Ok(user) => {
                request.extensions_mut().insert(user);
                next.run(request).await
            }
            Err(e) => {
                let message = match &e {
                    AuthError::Expired => "Token expired",
                    AuthError::MissingToken => "Missing token",
                    AuthError::InvalidToken(_) => "Invalid token",
                };
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("AUTH_ERROR", message)),
                )
                    .into_response()
            }
        },
        None => next.run(request).await,
    }
}

/// Extractor that requires an authenticated user.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(AuthRejection::Unauthenticated)
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    /// No valid authentication token was provided.
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let AuthRejection::Unauthenticated = self;
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "UNAUTHENTICATED",
                "Authentication required",
            )),
        )
            .into_response()
    }
}
