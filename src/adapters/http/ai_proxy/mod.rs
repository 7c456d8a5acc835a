//! AI proxy HTTP endpoints - streaming chat, regenerate, images, audio.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::ai_proxy_routes;
