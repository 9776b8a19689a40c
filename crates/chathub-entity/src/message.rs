//! Message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted one-to-one chat message.
///
/// Messages are append-only: once persisted they are never mutated or
/// deleted, and their ordering within a conversation is fixed by
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Unique message identifier.
    pub id: Uuid,
    /// The user who sent the message.
    pub sender_id: Uuid,
    /// The user the message is addressed to.
    pub receiver_id: Uuid,
    /// Text payload.
    pub body: String,
    /// Server-assigned creation time.
    pub created_at: DateTime<Utc>,
}

/// Data required to persist a new message.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Sending user.
    pub sender_id: Uuid,
    /// Receiving user.
    pub receiver_id: Uuid,
    /// Text payload.
    pub body: String,
}
