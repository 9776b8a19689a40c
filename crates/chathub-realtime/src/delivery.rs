//! Delivery router: persist every send, then push to the receiver's live
//! connection when one is bound.

use std::sync::Arc;

use uuid::Uuid;

use chathub_core::error::AppError;
use chathub_core::result::AppResult;
use chathub_database::repositories::message::MessageStore;
use chathub_entity::message::{Message, NewMessage};

use crate::connection::handle::ConnectionId;
use crate::connection::pool::ConnectionPool;
use crate::event::ServerEvent;
use crate::presence::PresenceRegistry;

/// Routes join, send, and disconnect events between the presence registry,
/// the message store, and live connections.
#[derive(Clone)]
pub struct DeliveryRouter {
    store: Arc<dyn MessageStore>,
    presence: Arc<PresenceRegistry>,
    connections: Arc<ConnectionPool>,
}

impl DeliveryRouter {
    /// Create a router over the given store, registry, and pool.
    pub fn new(
        store: Arc<dyn MessageStore>,
        presence: Arc<PresenceRegistry>,
        connections: Arc<ConnectionPool>,
    ) -> Self {
        Self {
            store,
            presence,
            connections,
        }
    }

    /// A client bound its user identity to a connection.
    pub fn on_join(&self, user_id: Uuid, conn_id: ConnectionId) {
        if self.presence.bind(user_id, conn_id) {
            tracing::info!(user_id = %user_id, conn_id = %conn_id, "User joined");
        } else {
            // Existing binding wins until its connection disconnects.
            tracing::debug!(
                user_id = %user_id,
                conn_id = %conn_id,
                "Join ignored, user already bound"
            );
        }
    }

    /// A client sent a message: persist it, then push it to the receiver
    /// if a connection is bound.
    ///
    /// Persistence failures surface to the caller and suppress the push.
    /// An offline receiver is not an error; the message waits in history.
    pub async fn on_send(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        body: &str,
    ) -> AppResult<Message> {
        if sender_id.is_nil() || receiver_id.is_nil() {
            return Err(AppError::validation("sender_id and receiver_id are required"));
        }
        if body.trim().is_empty() {
            return Err(AppError::validation("message body must not be empty"));
        }

        let message = self
            .store
            .persist(NewMessage {
                sender_id,
                receiver_id,
                body: body.to_string(),
            })
            .await?;

        match self.presence.lookup(&receiver_id) {
            Some(conn_id) => self.push(conn_id, &message),
            None => {
                tracing::debug!(
                    message_id = %message.id,
                    receiver_id = %receiver_id,
                    "Receiver offline, message stored only"
                );
            }
        }

        Ok(message)
    }

    /// A connection went away: release whatever binding it held.
    pub fn on_disconnect(&self, conn_id: &ConnectionId) {
        if let Some(user_id) = self.presence.unbind(conn_id) {
            tracing::info!(user_id = %user_id, conn_id = %conn_id, "User left");
        }
    }

    /// Best-effort push of a persisted message to a connection.
    fn push(&self, conn_id: ConnectionId, message: &Message) {
        let Some(handle) = self.connections.get(&conn_id) else {
            // Registry entry outlived the pool entry for a moment during
            // disconnect; the message is already durable.
            tracing::debug!(conn_id = %conn_id, "Bound connection no longer pooled, push skipped");
            return;
        };

        let delivered = handle.send(ServerEvent::Receive {
            message: message.clone(),
        });

        if delivered {
            tracing::debug!(
                message_id = %message.id,
                conn_id = %conn_id,
                "Message pushed to receiver"
            );
        } else {
            tracing::debug!(
                message_id = %message.id,
                conn_id = %conn_id,
                "Push to dead connection dropped, message remains in history"
            );
        }
    }
}

impl std::fmt::Debug for DeliveryRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryRouter").finish()
    }
}
