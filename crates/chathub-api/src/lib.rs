//! # chathub-api
//!
//! HTTP surface of ChatHub: REST routes for registration, login, user
//! listing and conversation history, plus the WebSocket upgrade that feeds
//! the real-time engine.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
