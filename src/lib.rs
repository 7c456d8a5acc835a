//! Parley - Conversational AI Chat Backend
//!
//! This crate implements the server and client core for a chat application:
//! CRUD routes for conversations, folders, votes, feedback, and shares, thin
//! proxies to AI providers, and the streaming response assembly / retry
//! versioning state machine that drives the chat UI.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
