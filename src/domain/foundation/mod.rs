//! Foundation value objects shared across the domain.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ValidationError};
pub use ids::{ConversationId, FolderId, MessageId, ShareToken, UserId};
pub use timestamp::Timestamp;
