//! PostgreSQL adapters.
//!
//! `sqlx`-backed implementations of the persistence ports, plus the enum
//! mapping helpers the repositories share.

mod conversation_repository;
mod engagement_repository;
mod folder_repository;
mod share_repository;

pub use conversation_repository::PostgresConversationRepository;
pub use engagement_repository::PostgresEngagementRepository;
pub use folder_repository::PostgresFolderRepository;
pub use share_repository::PostgresShareRepository;

use crate::domain::conversation::{ChatMode, Role};
use crate::domain::foundation::DomainError;
use crate::domain::library::VoteValue;

pub(crate) fn role_to_str(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

pub(crate) fn str_to_role(s: &str) -> Result<Role, DomainError> {
    match s {
        "user" => Ok(Role::User),
        "assistant" => Ok(Role::Assistant),
        other => Err(DomainError::database(format!("unknown role: {}", other))),
    }
}

pub(crate) fn mode_to_str(mode: ChatMode) -> &'static str {
    match mode {
        ChatMode::Default => "default",
        ChatMode::Search => "search",
        ChatMode::Auto => "auto",
        ChatMode::Image => "image",
    }
}

pub(crate) fn str_to_mode(s: &str) -> Result<ChatMode, DomainError> {
    match s {
        "default" => Ok(ChatMode::Default),
        "search" => Ok(ChatMode::Search),
        "auto" => Ok(ChatMode::Auto),
        "image" => Ok(ChatMode::Image),
        other => Err(DomainError::database(format!("unknown mode: {}", other))),
    }
}

pub(crate) fn vote_to_str(value: VoteValue) -> &'static str {
    match value {
        VoteValue::Up => "up",
        VoteValue::Down => "down",
    }
}

pub(crate) fn str_to_vote(s: &str) -> Result<VoteValue, DomainError> {
    match s {
        "up" => Ok(VoteValue::Up),
        "down" => Ok(VoteValue::Down),
        other => Err(DomainError::database(format!("unknown vote: {}", other))),
    }
}
