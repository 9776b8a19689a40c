//! Individual connection handle.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::ServerEvent;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// A handle to a single live connection.
///
/// Holds the buffered sender used to push events to the client. The
/// transport task on the other end drains the channel and writes to the
/// socket, so a push never blocks event processing for other connections.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Sender for outbound events.
    sender: mpsc::Sender<ServerEvent>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Create a new connection handle around an outbound channel.
    pub fn new(sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            alive: AtomicBool::new(true),
            connected_at: Utc::now(),
        }
    }

    /// Push an event to this connection, best effort.
    ///
    /// Returns `false` when the event was dropped: the send buffer is full
    /// or the transport side has gone away. Delivery is never retried; a
    /// missed push is recovered through the history endpoint.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Check if the connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection as dead.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
