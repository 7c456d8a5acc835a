//! Conversation HTTP endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::conversation_routes;
