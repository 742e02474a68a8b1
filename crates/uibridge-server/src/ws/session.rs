//! WebSocket session lifecycle — one connected client from upgrade through
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use uibridge_core::command::{ClientFrame, ServerFrame};
use uibridge_core::ids::ConnectionId;

use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};

use super::connection::ClientConnection;
use super::delivery::BridgeHandle;
use super::heartbeat::{HeartbeatResult, run_heartbeat};

/// Minimum per-connection outbound channel depth.
const OUTBOUND_CHANNEL_CAPACITY: usize = 1024;

/// Outbound channel depth for a connection.
///
/// The registration drain pushes the whole pending queue into this channel
/// before the writer task has necessarily caught up, so it must hold at
/// least `queue_capacity` frames or a large drain would evict a healthy
/// client.
fn outbound_capacity(queue_capacity: usize) -> usize {
    OUTBOUND_CHANNEL_CAPACITY.max(queue_capacity)
}

/// Run a WebSocket session for a connected client.
///
/// 1. Registers with the delivery worker, which drains any pending commands
///    to this client before any other frame is processed
/// 2. Answers the client control protocol (ping echo, status)
/// 3. Forwards outbound command frames via the send channel
/// 4. Sends periodic protocol Pings and evicts unresponsive clients
/// 5. Unregisters on any exit path
#[instrument(skip_all, fields(identity = identity.as_deref()))]
pub async fn run_ws_session(
    ws: WebSocket,
    identity: Option<String>,
    bridge: BridgeHandle,
    queue_capacity: usize,
    heartbeat_interval: Duration,
    heartbeat_timeout: Duration,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(outbound_capacity(queue_capacity));
    let connection = Arc::new(ClientConnection::new(
        ConnectionId::new(),
        identity,
        send_tx,
    ));
    let conn_id = connection.id.clone();

    info!(conn_id = %conn_id, "client connected");
    counter!(WS_CONNECTIONS_TOTAL).increment(1);

    // Registration drains the pending queue to this client; if that drain
    // fails the connection is already evicted and there is nothing to run.
    if !bridge.connect(connection.clone()).await {
        warn!(conn_id = %conn_id, "connection evicted during pending-queue drain");
        return;
    }

    // Outbound writer: multiplexes queued frames and protocol pings.
    let outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(heartbeat_interval);
        // Skip the immediate first tick
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Liveness watchdog, cancelled when the session ends first.
    let cancel = CancellationToken::new();
    let mut watchdog = tokio::spawn(run_heartbeat(
        connection.clone(),
        heartbeat_interval,
        heartbeat_timeout,
        cancel.clone(),
    ));

    let connection_start = std::time::Instant::now();
    loop {
        tokio::select! {
            maybe_msg = ws_rx.next() => {
                let Some(Ok(msg)) = maybe_msg else {
                    info!(conn_id = %conn_id, "client stream ended");
                    break;
                };
                match msg {
                    Message::Text(text) => {
                        connection.mark_alive();
                        handle_text(text.as_str(), &connection, &bridge).await;
                    }
                    Message::Binary(data) => {
                        connection.mark_alive();
                        match std::str::from_utf8(&data) {
                            Ok(text) => handle_text(text, &connection, &bridge).await,
                            Err(_) => {
                                info!(conn_id = %conn_id, len = data.len(), "non-UTF8 binary frame, ignoring");
                            }
                        }
                    }
                    Message::Close(_) => {
                        info!(conn_id = %conn_id, "client sent close frame");
                        break;
                    }
                    Message::Ping(_) | Message::Pong(_) => {
                        connection.mark_alive();
                    }
                }
            }
            result = &mut watchdog => {
                if matches!(result, Ok(HeartbeatResult::TimedOut)) {
                    warn!(conn_id = %conn_id, "heartbeat timeout, disconnecting client");
                }
                break;
            }
        }
    }

    info!(conn_id = %conn_id, "client disconnected");
    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(connection_start.elapsed().as_secs_f64());
    cancel.cancel();
    outbound.abort();
    bridge.disconnect(conn_id).await;
}

/// Handle one inbound text frame.
///
/// Protocol errors never close the connection: non-JSON and unknown frame
/// types are logged and dropped.
async fn handle_text(text: &str, connection: &ClientConnection, bridge: &BridgeHandle) {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => {
            warn!(conn_id = %connection.id, "invalid JSON on websocket, ignoring");
            return;
        }
    };

    let frame = match serde_json::from_value::<ClientFrame>(value.clone()) {
        Ok(f) => f,
        Err(_) => {
            warn!(
                conn_id = %connection.id,
                frame_type = value.get("type").and_then(|t| t.as_str()),
                "unknown message type, ignoring"
            );
            return;
        }
    };

    let reply = match frame {
        ClientFrame::Ping { timestamp } => ServerFrame::Pong { timestamp },
        ClientFrame::Status => {
            let stats = bridge.stats().await;
            match serde_json::to_value(&stats) {
                Ok(data) => ServerFrame::Stats { data },
                Err(e) => {
                    warn!(conn_id = %connection.id, error = %e, "failed to serialize stats");
                    return;
                }
            }
        }
    };

    match serde_json::to_string(&reply) {
        Ok(json) => {
            if !connection.send(Arc::new(json)) {
                warn!(conn_id = %connection.id, "failed to enqueue control reply");
            }
        }
        Err(e) => {
            warn!(conn_id = %connection.id, error = %e, "failed to serialize control reply");
        }
    }
}
