//! Presence registry: the single source of truth for which connection, if
//! any, currently represents a user.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

use crate::connection::handle::ConnectionId;

/// In-memory mapping between user identities and live connections.
///
/// Holds at most one entry per user. A `bind` for an already-bound user is
/// a silent no-op: the existing connection keeps the binding until it
/// disconnects. Entries are reclaimed only through [`PresenceRegistry::unbind`],
/// which the connection lifecycle guarantees to run on every disconnect
/// path.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    /// User ID → bound connection.
    by_user: DashMap<Uuid, ConnectionId>,
    /// Bound connection → user ID (reverse index for O(1) unbind).
    by_conn: DashMap<ConnectionId, Uuid>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_user: DashMap::new(),
            by_conn: DashMap::new(),
        }
    }

    /// Register the connection for the user, unless the user already has
    /// one. Returns `true` if the binding took effect.
    pub fn bind(&self, user_id: Uuid, conn_id: ConnectionId) -> bool {
        match self.by_user.entry(user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(conn_id);
                self.by_conn.insert(conn_id, user_id);
                true
            }
        }
    }

    /// Remove whatever binding the connection holds. Idempotent; returns
    /// the user that was bound, if any.
    pub fn unbind(&self, conn_id: &ConnectionId) -> Option<Uuid> {
        let (_, user_id) = self.by_conn.remove(conn_id)?;
        self.by_user.remove_if(&user_id, |_, bound| bound == conn_id);
        Some(user_id)
    }

    /// The connection currently bound to the user, if the user is online.
    pub fn lookup(&self, user_id: &Uuid) -> Option<ConnectionId> {
        self.by_user.get(user_id).map(|entry| *entry.value())
    }

    /// Whether the user currently has a bound connection.
    pub fn is_online(&self, user_id: &Uuid) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// Number of users with a bound connection.
    pub fn online_count(&self) -> usize {
        self.by_user.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_then_lookup() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        assert!(registry.bind(user, conn));
        assert_eq!(registry.lookup(&user), Some(conn));
        assert!(registry.is_online(&user));
        assert_eq!(registry.online_count(), 1);
    }

    #[test]
    fn test_second_bind_is_noop() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        assert!(registry.bind(user, first));
        assert!(!registry.bind(user, second));

        // The original binding survives a rejoin without a disconnect.
        assert_eq!(registry.lookup(&user), Some(first));
    }

    #[test]
    fn test_unbind_is_idempotent() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.bind(user, conn);
        assert_eq!(registry.unbind(&conn), Some(user));
        assert_eq!(registry.unbind(&conn), None);
        assert_eq!(registry.lookup(&user), None);
        assert_eq!(registry.online_count(), 0);
    }

    #[test]
    fn test_unbind_unknown_connection_is_noop() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let conn = Uuid::new_v4();

        registry.bind(user, conn);
        assert_eq!(registry.unbind(&Uuid::new_v4()), None);
        assert_eq!(registry.lookup(&user), Some(conn));
    }

    #[test]
    fn test_rebind_after_unbind() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        registry.bind(user, first);
        registry.unbind(&first);
        assert!(registry.bind(user, second));
        assert_eq!(registry.lookup(&user), Some(second));
    }

    #[test]
    fn test_stale_conn_unbind_does_not_evict_new_binding() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        registry.bind(user, first);
        registry.unbind(&first);
        registry.bind(user, second);

        // A late duplicate unbind for the old connection must not touch
        // the new binding.
        assert_eq!(registry.unbind(&first), None);
        assert_eq!(registry.lookup(&user), Some(second));
    }
}
