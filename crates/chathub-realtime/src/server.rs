//! Top-level real-time engine that ties the subsystems together.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

use chathub_core::config::realtime::RealtimeConfig;
use chathub_database::repositories::message::MessageStore;

use crate::connection::manager::ConnectionManager;
use crate::connection::pool::ConnectionPool;
use crate::delivery::DeliveryRouter;
use crate::presence::PresenceRegistry;

/// Central real-time engine coordinating presence, delivery, and
/// connection lifecycle.
///
/// Constructed once at process start and shared via `Arc`; all connection
/// handlers reach the registry through it rather than through any global
/// state.
pub struct RealtimeEngine {
    /// Connection manager.
    pub connections: Arc<ConnectionManager>,
    /// Presence registry.
    pub presence: Arc<PresenceRegistry>,
    /// Engine configuration.
    config: RealtimeConfig,
    /// Shutdown signal sender.
    shutdown_tx: broadcast::Sender<()>,
}

impl RealtimeEngine {
    /// Create a new engine over the given message store.
    pub fn new(config: RealtimeConfig, store: Arc<dyn MessageStore>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let presence = Arc::new(PresenceRegistry::new());
        let pool = Arc::new(ConnectionPool::new());
        let router = DeliveryRouter::new(store, presence.clone(), pool.clone());
        let connections = Arc::new(ConnectionManager::new(
            pool,
            router,
            config.channel_buffer_size,
        ));

        info!("Real-time engine initialized");

        Self {
            connections,
            presence,
            config,
            shutdown_tx,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Returns a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signals all connection tasks to stop.
    pub fn shutdown(&self) {
        info!("Shutting down real-time engine");
        let _ = self.shutdown_tx.send(());
    }
}

impl std::fmt::Debug for RealtimeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeEngine").finish()
    }
}
