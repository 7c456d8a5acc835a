//! Vote and feedback HTTP endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::engagement_routes;
