//! Error types for the domain layer.

use thiserror::Error;

/// Errors that occur during value object construction and input validation.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must have at most {max} items, got {actual}")]
    TooManyItems {
        field: String,
        max: usize,
        actual: usize,
    },

    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField {
            field: field.into(),
        }
    }

    /// Creates a too-many-items validation error.
    pub fn too_many_items(field: impl Into<String>, max: usize, actual: usize) -> Self {
        ValidationError::TooManyItems {
            field: field.into(),
            max,
            actual,
        }
    }

    /// Creates a too-long validation error.
    pub fn too_long(field: impl Into<String>, max: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            max,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Domain-level errors, surfaced by repositories and command handlers.
///
/// Each variant maps to exactly one HTTP status class in the HTTP adapter;
/// collaborator errors (database, providers) are wrapped once at the
/// boundary and never retried here.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Input failed validation before any network or database call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The named resource does not exist (or is not visible to this user).
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// The caller is not allowed to act on this resource.
    #[error("not authorized to access this resource")]
    Unauthorized,

    /// An upstream AI provider failed.
    #[error("upstream provider error: {0}")]
    Upstream(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl DomainError {
    /// Creates a not-found error for a resource.
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Creates an upstream provider error.
    pub fn upstream(message: impl Into<String>) -> Self {
        DomainError::Upstream(message.into())
    }

    /// Creates a database error.
    pub fn database(message: impl Into<String>) -> Self {
        DomainError::Database(message.into())
    }

    /// Returns true if this error is caused by bad caller input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::Validation(_) | DomainError::NotFound { .. } | DomainError::Unauthorized
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_displays_field() {
        let err = ValidationError::empty_field("query");
        assert_eq!(err.to_string(), "Field 'query' cannot be empty");
    }

    #[test]
    fn too_many_items_displays_counts() {
        let err = ValidationError::too_many_items("images", 3, 5);
        assert_eq!(
            err.to_string(),
            "Field 'images' must have at most 3 items, got 5"
        );
    }

    #[test]
    fn not_found_includes_resource_and_id() {
        let err = DomainError::not_found("conversation", "abc");
        assert_eq!(err.to_string(), "conversation not found: abc");
    }

    #[test]
    fn client_error_classification() {
        assert!(DomainError::Unauthorized.is_client_error());
        assert!(DomainError::not_found("folder", "x").is_client_error());
        assert!(DomainError::from(ValidationError::empty_field("q")).is_client_error());

        assert!(!DomainError::upstream("500").is_client_error());
        assert!(!DomainError::database("down").is_client_error());
    }
}
