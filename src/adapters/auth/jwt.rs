//! JWT adapter for bearer token verification.
//!
//! Implements the `TokenVerifier` port with `jsonwebtoken` over an HMAC
//! secret shared with the identity provider. Validates signature, expiry,
//! and (when configured) issuer and audience before mapping the subject
//! claim to a domain [`AuthenticatedUser`].

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::domain::foundation::UserId;
use crate::ports::{AuthError, AuthenticatedUser, TokenVerifier};

/// Configuration for the JWT verifier.
#[derive(Debug, Clone)]
pub struct JwtVerifierConfig {
    /// HMAC secret shared with the identity provider.
    pub secret: String,
    /// Expected issuer claim, if enforced.
    pub issuer: Option<String>,
    /// Expected audience claim, if enforced.
    pub audience: Option<String>,
    /// Clock skew leeway in seconds.
    pub leeway_secs: u64,
}

impl JwtVerifierConfig {
    /// Creates a configuration with the given secret and no issuer or
    /// audience checks.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: None,
            audience: None,
            leeway_secs: 30,
        }
    }

    /// Requires the issuer claim to match.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Requires the audience claim to contain the value.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }
}

/// Claims we read from a verified token.
#[derive(Debug, Deserialize)]
struct Claims {
    /// Subject - the user id.
    sub: String,
}

/// Production token verifier over an HMAC-signed JWT.
pub struct JwtTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    /// Creates a new verifier from the configuration.
    pub fn new(config: JwtVerifierConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_secs;
        if let Some(ref issuer) = config.issuer {
            validation.set_issuer(&[issuer]);
        }
        if let Some(ref audience) = config.audience {
            validation.set_audience(&[audience]);
        } else {
            validation.validate_aud = false;
        }

        Self {
            decoding_key,
            validation,
        }
    }
}

#[async_trait]
impl TokenVerifier for JwtTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            }
        })?;

        let user_id = UserId::new(data.claims.sub)
            .map_err(|e| AuthError::InvalidToken(format!("bad subject claim: {}", e)))?;

        Ok(AuthenticatedUser::new(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        iss: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        aud: Option<String>,
    }

    fn sign(claims: &TestClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let verifier = JwtTokenVerifier::new(JwtVerifierConfig::new(SECRET));
        let token = sign(&TestClaims {
            sub: "user-42".to_string(),
            exp: future_exp(),
            iss: None,
            aud: None,
        });

        let user = verifier.verify(&token).await.unwrap();
        assert_eq!(user.user_id.as_str(), "user-42");
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let verifier = JwtTokenVerifier::new(JwtVerifierConfig::new(SECRET));
        let token = sign(&TestClaims {
            sub: "user-42".to_string(),
            exp: chrono::Utc::now().timestamp() - 3600,
            iss: None,
            aud: None,
        });

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let verifier = JwtTokenVerifier::new(JwtVerifierConfig::new("another-secret-entirely!!"));
        let token = sign(&TestClaims {
            sub: "user-42".to_string(),
            exp: future_exp(),
            iss: None,
            aud: None,
        });

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn enforces_issuer_when_configured() {
        let verifier = JwtTokenVerifier::new(
            JwtVerifierConfig::new(SECRET).with_issuer("https://auth.example.com"),
        );

        let wrong = sign(&TestClaims {
            sub: "user-42".to_string(),
            exp: future_exp(),
            iss: Some("https://evil.example.com".to_string()),
            aud: None,
        });
        assert!(verifier.verify(&wrong).await.is_err());

        let right = sign(&TestClaims {
            sub: "user-42".to_string(),
            exp: future_exp(),
            iss: Some("https://auth.example.com".to_string()),
            aud: None,
        });
        assert!(verifier.verify(&right).await.is_ok());
    }

    #[tokio::test]
    async fn empty_token_is_missing() {
        let verifier = JwtTokenVerifier::new(JwtVerifierConfig::new(SECRET));
        assert!(matches!(
            verifier.verify("").await,
            Err(AuthError::MissingToken)
        ));
    }
}
