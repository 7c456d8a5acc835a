//! Authentication port - bearer token verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::UserId;

/// The user a verified token belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl AuthenticatedUser {
    /// Creates an authenticated user.
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Token verification errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// No bearer token on the request.
    #[error("missing bearer token")]
    MissingToken,

    /// The token failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The token is expired.
    #[error("token expired")]
    Expired,
}

/// Port for verifying bearer tokens issued by the identity provider.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verifies a raw bearer token and returns its user.
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}
