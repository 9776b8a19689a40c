//! Connection manager: accepts connections, dispatches their inbound
//! events, and guarantees cleanup on disconnect.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use chathub_core::error::ErrorKind;

use crate::delivery::DeliveryRouter;
use crate::event::{ClientEvent, ServerEvent};

use super::handle::{ConnectionHandle, ConnectionId};
use super::pool::ConnectionPool;

/// Owns the per-connection lifecycle: register, dispatch, unregister.
///
/// Every transport exit path must call [`ConnectionManager::unregister`];
/// pool removal yields the handle at most once, so presence cleanup runs
/// exactly once per connection no matter how it terminated.
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    router: DeliveryRouter,
    channel_buffer_size: usize,
}

impl ConnectionManager {
    /// Create a manager over the shared pool and router.
    pub fn new(pool: Arc<ConnectionPool>, router: DeliveryRouter, channel_buffer_size: usize) -> Self {
        Self {
            pool,
            router,
            channel_buffer_size,
        }
    }

    /// Register a newly accepted connection.
    ///
    /// Returns the handle and the receiver the transport task drains into
    /// the socket. The connection starts unbound; a join event binds it.
    pub fn register(&self) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.channel_buffer_size);
        let handle = Arc::new(ConnectionHandle::new(tx));

        self.pool.add(handle.clone());
        info!(conn_id = %handle.id, "Connection registered");

        (handle, rx)
    }

    /// Process a raw inbound frame from a connection.
    ///
    /// Malformed payloads and validation rejections answer the offending
    /// connection with a [`ServerEvent::Error`] and leave it alive.
    /// Persistence failures are logged, never propagated to the peer.
    pub async fn handle_event(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Event from unknown connection");
            return;
        };

        let event: ClientEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                handle.send(ServerEvent::Error {
                    code: "INVALID_EVENT".to_string(),
                    message: format!("Failed to parse event: {e}"),
                });
                return;
            }
        };

        match event {
            ClientEvent::Join { user_id } => {
                self.router.on_join(user_id, *conn_id);
            }
            ClientEvent::Send {
                sender_id,
                receiver_id,
                body,
            } => {
                if let Err(e) = self.router.on_send(sender_id, receiver_id, &body).await {
                    match e.kind {
                        ErrorKind::Validation => {
                            handle.send(ServerEvent::Error {
                                code: "VALIDATION".to_string(),
                                message: e.message,
                            });
                        }
                        _ => {
                            tracing::error!(
                                conn_id = %conn_id,
                                error = %e,
                                "Failed to persist message"
                            );
                        }
                    }
                }
            }
        }
    }

    /// Tear down a connection: remove it from the pool and release its
    /// presence binding. Safe to call from any exit path; only the first
    /// call observes the handle.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            self.router.on_disconnect(conn_id);
            info!(conn_id = %conn_id, "Connection unregistered");
        }
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("channel_buffer_size", &self.channel_buffer_size)
            .finish()
    }
}
