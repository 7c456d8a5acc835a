//! Folder HTTP endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use routes::folder_routes;
