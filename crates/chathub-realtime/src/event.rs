//! Inbound and outbound live-protocol event definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use chathub_entity::message::Message;

/// Events sent by the client over its connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Bind the sending user's identity to this connection.
    Join {
        /// The joining user.
        user_id: Uuid,
    },
    /// Send a one-to-one message.
    Send {
        /// Sending user.
        sender_id: Uuid,
        /// Receiving user.
        receiver_id: Uuid,
        /// Text payload.
        body: String,
    },
}

/// Events pushed by the server to a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A message addressed to the connection's bound user.
    Receive {
        /// The persisted message.
        message: Message,
    },
    /// Error feedback for a rejected client event.
    Error {
        /// Machine-readable error code.
        code: String,
        /// Human-readable description.
        message: String,
    },
}
