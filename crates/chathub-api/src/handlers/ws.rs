//! WebSocket upgrade handler and per-connection socket tasks.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for WebSocket authentication.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    /// JWT access token.
    pub token: String,
}

/// GET /ws?token={jwt} — WebSocket upgrade
///
/// The token is validated before the upgrade; the live protocol itself
/// (join/send) runs over the established socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let claims = state.jwt_decoder.decode_access_token(&query.token)?;

    info!(user_id = %claims.user_id(), "WebSocket upgrade authenticated");

    Ok(ws.on_upgrade(move |socket| handle_socket(state, socket)))
}

/// Drives an established WebSocket connection until it closes.
///
/// Every exit path (clean close, protocol error, transport error,
/// shutdown) falls through to the single `unregister` call at the end, so
/// presence cleanup runs on abnormal termination too.
async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state.realtime.connections.register();
    let conn_id = handle.id;

    let ping_interval = Duration::from_secs(state.realtime.config().ping_interval_seconds);

    // Outbound forwarder: drains the connection's event channel into the
    // socket and keeps the peer alive with periodic pings.
    let outbound_task = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        ping.tick().await;

        loop {
            tokio::select! {
                maybe_event = outbound_rx.recv() => {
                    let Some(event) = maybe_event else { break };
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "Failed to serialize outbound event");
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    let mut shutdown_rx = state.realtime.shutdown_receiver();

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            maybe_frame = ws_rx.next() => {
                match maybe_frame {
                    Some(Ok(Message::Text(text))) => {
                        state
                            .realtime
                            .connections
                            .handle_event(&conn_id, text.as_str())
                            .await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    outbound_task.abort();
    state.realtime.connections.unregister(&conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}
