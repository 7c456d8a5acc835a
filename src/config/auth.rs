//! Authentication configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// Authentication configuration (JWT bearer tokens)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to verify bearer tokens
    pub jwt_secret: String,

    /// Expected token issuer
    #[serde(default)]
    pub issuer: Option<String>,

    /// Expected token audience
    #[serde(default)]
    pub audience: Option<String>,

    /// Clock skew leeway in seconds when checking expiry
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least 32 bytes. Development
    /// only requires it to be non-empty.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }

        if *environment == Environment::Production && self.jwt_secret.len() < 32 {
            return Err(ValidationError::JwtSecretTooShort);
        }

        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            issuer: None,
            audience: None,
            leeway_secs: default_leeway_secs(),
        }
    }
}

fn default_leeway_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_missing_secret() {
        let config = AuthConfig::default();
        assert!(config.validate(&Environment::Development).is_err());
    }

    #[test]
    fn test_validation_production_requires_long_secret() {
        let config = AuthConfig {
            jwt_secret: "short".to_string(),
            ..Default::default()
        };
        // Allowed in development
        assert!(config.validate(&Environment::Development).is_ok());
        // Rejected in production
        assert!(matches!(
            config.validate(&Environment::Production),
            Err(ValidationError::JwtSecretTooShort)
        ));
    }

    #[test]
    fn test_validation_valid_config() {
        let config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            issuer: Some("https://auth.example.com".to_string()),
            audience: Some("parley-api".to_string()),
            ..Default::default()
        };
        assert!(config.validate(&Environment::Production).is_ok());
    }
}
