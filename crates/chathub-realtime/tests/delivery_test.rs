//! Scenario tests for the delivery path: join, send, push, disconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use chathub_core::error::{AppError, ErrorKind};
use chathub_core::result::AppResult;
use chathub_database::repositories::message::MessageStore;
use chathub_entity::message::{Message, NewMessage};
use chathub_realtime::connection::manager::ConnectionManager;
use chathub_realtime::connection::pool::ConnectionPool;
use chathub_realtime::delivery::DeliveryRouter;
use chathub_realtime::event::ServerEvent;
use chathub_realtime::presence::PresenceRegistry;

/// In-memory message store standing in for the PostgreSQL repository.
struct MemoryMessageStore {
    messages: std::sync::Mutex<Vec<Message>>,
    base: DateTime<Utc>,
    seq: AtomicI64,
    fail_persist: AtomicBool,
}

impl MemoryMessageStore {
    fn new() -> Self {
        Self {
            messages: std::sync::Mutex::new(Vec::new()),
            base: Utc::now(),
            seq: AtomicI64::new(0),
            fail_persist: AtomicBool::new(false),
        }
    }

    fn fail_next_persists(&self) {
        self.fail_persist.store(true, Ordering::SeqCst);
    }

    fn stored_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn persist(&self, message: NewMessage) -> AppResult<Message> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AppError::new(ErrorKind::Database, "store unavailable"));
        }

        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let stored = Message {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            body: message.body,
            created_at: self.base + Duration::milliseconds(seq),
        };
        self.messages.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn history(&self, user_a: Uuid, user_b: Uuid) -> AppResult<Vec<Message>> {
        let mut matching: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.receiver_id == user_b)
                    || (m.sender_id == user_b && m.receiver_id == user_a)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.created_at);
        Ok(matching)
    }
}

struct Harness {
    store: Arc<MemoryMessageStore>,
    presence: Arc<PresenceRegistry>,
    manager: ConnectionManager,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryMessageStore::new());
    let presence = Arc::new(PresenceRegistry::new());
    let pool = Arc::new(ConnectionPool::new());
    let router = DeliveryRouter::new(store.clone(), presence.clone(), pool.clone());
    let manager = ConnectionManager::new(pool, router, 16);
    Harness {
        store,
        presence,
        manager,
    }
}

fn join_frame(user_id: Uuid) -> String {
    format!(r#"{{"type":"join","user_id":"{user_id}"}}"#)
}

fn send_frame(sender: Uuid, receiver: Uuid, body: &str) -> String {
    format!(
        r#"{{"type":"send","sender_id":"{sender}","receiver_id":"{receiver}","body":"{body}"}}"#
    )
}

fn expect_receive(rx: &mut mpsc::Receiver<ServerEvent>) -> Message {
    match rx.try_recv().expect("expected a pushed event") {
        ServerEvent::Receive { message } => message,
        other => panic!("expected receive event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_send_to_online_receiver_pushes_persisted_message() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (alice_conn, mut alice_rx) = h.manager.register();
    h.manager
        .handle_event(&alice_conn.id, &join_frame(alice))
        .await;

    let (bob_conn, _bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "hi"))
        .await;

    let pushed = expect_receive(&mut alice_rx);
    assert_eq!(pushed.sender_id, bob);
    assert_eq!(pushed.receiver_id, alice);
    assert_eq!(pushed.body, "hi");

    // Exactly one push, and the message is durable.
    assert!(alice_rx.try_recv().is_err());
    assert_eq!(h.store.stored_count(), 1);
    let history = h.store.history(alice, bob).await.unwrap();
    assert_eq!(history, vec![pushed]);
}

#[tokio::test]
async fn test_send_to_offline_receiver_persists_without_push() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (bob_conn, mut bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "anyone home?"))
        .await;

    assert_eq!(h.store.stored_count(), 1);
    // No error feedback either: an offline receiver is a normal outcome.
    assert!(bob_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_send_after_receiver_disconnect_persists_silently() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (alice_conn, mut alice_rx) = h.manager.register();
    h.manager
        .handle_event(&alice_conn.id, &join_frame(alice))
        .await;

    let (bob_conn, mut bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "hi"))
        .await;
    let first = expect_receive(&mut alice_rx);
    assert_eq!(first.body, "hi");

    h.manager.unregister(&alice_conn.id);
    assert!(!h.presence.is_online(&alice));

    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "still there?"))
        .await;

    // Second message persisted, no push anywhere, no error to the sender.
    assert_eq!(h.store.stored_count(), 2);
    assert!(bob_rx.try_recv().is_err());

    let history = h.store.history(bob, alice).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].body, "still there?");
}

#[tokio::test]
async fn test_rejoin_keeps_first_connection_bound() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (first_conn, mut first_rx) = h.manager.register();
    h.manager
        .handle_event(&first_conn.id, &join_frame(alice))
        .await;

    // Alice "rejoins" from a second connection without disconnecting.
    let (second_conn, mut second_rx) = h.manager.register();
    h.manager
        .handle_event(&second_conn.id, &join_frame(alice))
        .await;

    assert_eq!(h.presence.lookup(&alice), Some(first_conn.id));

    let (bob_conn, _bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "which one?"))
        .await;

    // Delivery goes to the original connection only.
    assert_eq!(expect_receive(&mut first_rx).body, "which one?");
    assert!(second_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_empty_body_rejected_before_store() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (bob_conn, mut bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "   "))
        .await;

    assert_eq!(h.store.stored_count(), 0);
    match bob_rx.try_recv().unwrap() {
        ServerEvent::Error { code, .. } => assert_eq!(code, "VALIDATION"),
        other => panic!("expected error event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_persist_failure_surfaces_and_skips_push() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (alice_conn, mut alice_rx) = h.manager.register();
    h.manager
        .handle_event(&alice_conn.id, &join_frame(alice))
        .await;

    h.store.fail_next_persists();

    let (bob_conn, mut bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "hi"))
        .await;

    // Nothing delivered, nothing leaked to the peer, connections alive.
    assert!(alice_rx.try_recv().is_err());
    assert!(bob_rx.try_recv().is_err());
    assert_eq!(h.manager.connection_count(), 2);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_alive() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (alice_conn, mut alice_rx) = h.manager.register();
    h.manager.handle_event(&alice_conn.id, "not json").await;

    match alice_rx.try_recv().unwrap() {
        ServerEvent::Error { code, .. } => assert_eq!(code, "INVALID_EVENT"),
        other => panic!("expected error event, got {other:?}"),
    }

    // The connection still works afterwards.
    h.manager
        .handle_event(&alice_conn.id, &join_frame(alice))
        .await;
    let (bob_conn, _bob_rx) = h.manager.register();
    h.manager
        .handle_event(&bob_conn.id, &send_frame(bob, alice, "ping"))
        .await;
    assert_eq!(expect_receive(&mut alice_rx).body, "ping");
}

#[tokio::test]
async fn test_unregister_is_idempotent_and_frees_the_user() {
    let h = harness();
    let alice = Uuid::new_v4();

    let (conn, _rx) = h.manager.register();
    h.manager.handle_event(&conn.id, &join_frame(alice)).await;
    assert!(h.presence.is_online(&alice));

    h.manager.unregister(&conn.id);
    h.manager.unregister(&conn.id);

    assert!(!h.presence.is_online(&alice));
    assert_eq!(h.manager.connection_count(), 0);

    // Alice can rebind through a fresh connection.
    let (fresh, _rx2) = h.manager.register();
    h.manager.handle_event(&fresh.id, &join_frame(alice)).await;
    assert_eq!(h.presence.lookup(&alice), Some(fresh.id));
}

#[tokio::test]
async fn test_history_is_direction_agnostic_and_ascending() {
    let h = harness();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    let (conn, _rx) = h.manager.register();
    for (from, to, body) in [
        (alice, bob, "one"),
        (bob, alice, "two"),
        (alice, bob, "three"),
    ] {
        h.manager
            .handle_event(&conn.id, &send_frame(from, to, body))
            .await;
    }

    let forward = h.store.history(alice, bob).await.unwrap();
    let reverse = h.store.history(bob, alice).await.unwrap();

    assert_eq!(forward, reverse);
    let bodies: Vec<&str> = forward.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
    assert!(forward.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}
