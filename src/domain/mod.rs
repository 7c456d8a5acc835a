//! Domain layer - core business types and logic.
//!
//! - `foundation`: shared value objects (ids, timestamps, errors)
//! - `conversation`: the in-memory session and streaming state machine
//! - `library`: persisted chat records (conversations, folders, votes,
//!   feedback, shares)

pub mod conversation;
pub mod foundation;
pub mod library;
