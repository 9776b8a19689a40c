//! Message store contract and its PostgreSQL implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_entity::message::{Message, NewMessage};

/// Durable, append-only message persistence.
///
/// The real-time delivery path talks to this trait rather than to a
/// concrete repository so that routing logic stays testable without a
/// database.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Write a message durably and return the stored record, including the
    /// server-assigned id and creation time.
    async fn persist(&self, message: NewMessage) -> AppResult<Message>;

    /// Every message exchanged between the two users, in either direction,
    /// ascending by creation time.
    async fn history(&self, user_a: Uuid, user_b: Uuid) -> AppResult<Vec<Message>>;
}

/// Repository for message persistence and conversation queries.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn persist(&self, message: NewMessage) -> AppResult<Message> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (sender_id, receiver_id, body) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(message.sender_id)
        .bind(message.receiver_id)
        .bind(&message.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to persist message", e))
    }

    async fn history(&self, user_a: Uuid, user_b: Uuid) -> AppResult<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages \
             WHERE (sender_id = $1 AND receiver_id = $2) \
                OR (sender_id = $2 AND receiver_id = $1) \
             ORDER BY created_at ASC",
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load conversation", e))
    }
}
