//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chathub_auth::jwt::decoder::JwtDecoder;
use chathub_auth::jwt::encoder::JwtEncoder;
use chathub_auth::password::PasswordHasher;
use chathub_core::config::AppConfig;
use chathub_database::connection::DatabasePool;
use chathub_database::repositories::message::MessageRepository;
use chathub_database::repositories::user::UserRepository;
use chathub_realtime::server::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool.
    pub db: DatabasePool,
    /// User repository.
    pub user_repo: Arc<UserRepository>,
    /// Message repository.
    pub message_repo: Arc<MessageRepository>,
    /// JWT token encoder.
    pub jwt_encoder: Arc<JwtEncoder>,
    /// JWT token decoder and validator.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Password hasher (Argon2).
    pub password_hasher: Arc<PasswordHasher>,
    /// Real-time engine.
    pub realtime: Arc<RealtimeEngine>,
}
