//! Mock token verifier for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::UserId;
use crate::ports::{AuthError, AuthenticatedUser, TokenVerifier};

/// In-memory token verifier mapping fixed tokens to users.
///
/// Unknown tokens are rejected, so handler tests can exercise both the
/// authorized and unauthorized paths without a real identity provider.
#[derive(Default)]
pub struct MockTokenVerifier {
    tokens: Mutex<HashMap<String, UserId>>,
}

impl MockTokenVerifier {
    /// Creates an empty verifier that rejects everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for a user.
    pub fn allow(self, token: impl Into<String>, user_id: UserId) -> Self {
        {
            let mut tokens = self.tokens.lock().unwrap();
            tokens.insert(token.into(), user_id);
        }
        self
    }
}

#[async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let tokens = self.tokens.lock().unwrap();
        tokens
            .get(token)
            .cloned()
            .map(AuthenticatedUser::new)
            .ok_or_else(|| AuthError::InvalidToken("unknown token".to_string()))
    }
}
