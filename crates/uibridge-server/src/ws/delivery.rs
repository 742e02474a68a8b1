//! Command delivery: fan-out, targeted sends, and queue draining.
//!
//! All registry and queue mutation happens on one worker task
//! ([`CommandBridge::run`]) that consumes [`BridgeRequest`]s from a channel.
//! Action handlers, WebSocket sessions, and HTTP handlers hold a cloneable
//! [`BridgeHandle`] and never touch the state directly, so there is no shared
//! mutable state and no lock.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use uibridge_core::command::UiCommand;
use uibridge_core::ids::ConnectionId;
use uibridge_rpc::catalog::CommandSink;

use crate::metrics::{
    COMMANDS_DELIVERED_TOTAL, CONNECTIONS_EVICTED_TOTAL, QUEUE_DEPTH, WS_CONNECTIONS_ACTIVE,
};

use super::connection::ClientConnection;
use super::queue::PendingQueue;
use super::registry::{ConnectedUser, ConnectionRegistry};

/// Capacity of the worker's request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 256;

/// Snapshot of the bridge's state for `/mcp/stats` and `status` frames.
#[derive(Clone, Debug, Serialize)]
pub struct BridgeStats {
    /// Live connection count.
    pub total_connections: usize,
    /// Per-connection summaries.
    pub connected_users: Vec<ConnectedUser>,
    /// Commands waiting for a connection.
    pub queued_commands: usize,
}

/// A request for the delivery worker.
pub enum BridgeRequest {
    /// Deliver to every connection, or queue if none exist.
    Broadcast(UiCommand),
    /// Deliver to connections matching an identity, or queue if none match.
    SendToIdentity {
        /// Exact identity tag to match.
        identity: String,
        /// The command to deliver.
        command: UiCommand,
    },
    /// Register a new connection and drain the pending queue to it.
    ///
    /// The ack is `true` if the connection survived the drain.
    Connect {
        /// The newly established connection.
        connection: Arc<ClientConnection>,
        /// Completes once registration and drain are done.
        ack: oneshot::Sender<bool>,
    },
    /// Remove a connection. Idempotent.
    Disconnect(ConnectionId),
    /// Read-only state snapshot.
    Stats {
        /// Receives the snapshot.
        reply: oneshot::Sender<BridgeStats>,
    },
}

/// The delivery worker: owns the registry and pending queue.
pub struct CommandBridge {
    registry: ConnectionRegistry,
    queue: PendingQueue,
    rx: mpsc::Receiver<BridgeRequest>,
}

impl CommandBridge {
    /// Spawn the worker and return a handle plus its join handle.
    pub fn spawn(queue_capacity: usize) -> (BridgeHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
        let bridge = Self {
            registry: ConnectionRegistry::new(),
            queue: PendingQueue::new(queue_capacity),
            rx,
        };
        let handle = tokio::spawn(bridge.run());
        (BridgeHandle { tx }, handle)
    }

    /// Process requests until every handle is dropped.
    async fn run(mut self) {
        info!("delivery worker started");
        while let Some(request) = self.rx.recv().await {
            match request {
                BridgeRequest::Broadcast(command) => self.broadcast(command),
                BridgeRequest::SendToIdentity { identity, command } => {
                    self.send_to_identity(&identity, command);
                }
                BridgeRequest::Connect { connection, ack } => {
                    let ok = self.connect(connection);
                    let _ = ack.send(ok);
                }
                BridgeRequest::Disconnect(id) => {
                    self.registry.unregister(&id);
                    gauge!(WS_CONNECTIONS_ACTIVE).set(self.registry.len() as f64);
                }
                BridgeRequest::Stats { reply } => {
                    let _ = reply.send(self.stats());
                }
            }
            gauge!(QUEUE_DEPTH).set(self.queue.len() as f64);
        }
        info!("delivery worker stopped");
    }

    /// Deliver to every registered connection, queueing when none exist.
    ///
    /// Failures are independent per connection; a failed send evicts that
    /// connection and never blocks the others. No retry.
    fn broadcast(&mut self, command: UiCommand) {
        if self.registry.is_empty() {
            debug!(command_type = command.command_type, "no clients, queueing command");
            self.queue.enqueue(command);
            return;
        }

        let Some(frame) = encode(&command) else {
            return;
        };

        let mut failed = Vec::new();
        for conn in self.registry.snapshot() {
            if conn.send(frame.clone()) {
                conn.record_command();
                counter!(COMMANDS_DELIVERED_TOTAL).increment(1);
            } else {
                warn!(conn_id = %conn.id, "send failed, evicting connection");
                failed.push(conn.id.clone());
            }
        }
        self.evict(failed);
    }

    /// Deliver to connections matching `identity`, queueing when none match.
    fn send_to_identity(&mut self, identity: &str, command: UiCommand) {
        let matches = self.registry.find(identity);
        if matches.is_empty() {
            debug!(identity, command_type = command.command_type, "no match, queueing command");
            self.queue.enqueue(command);
            return;
        }

        let Some(frame) = encode(&command) else {
            return;
        };

        let mut failed = Vec::new();
        for conn in matches {
            if conn.send(frame.clone()) {
                conn.record_command();
                counter!(COMMANDS_DELIVERED_TOTAL).increment(1);
            } else {
                warn!(conn_id = %conn.id, identity, "send failed, evicting connection");
                failed.push(conn.id.clone());
            }
        }
        self.evict(failed);
    }

    /// Register a connection and drain the pending queue to it.
    ///
    /// A failed send mid-drain aborts the drain (the remainder stays queued)
    /// and evicts the connection. Returns `true` if it survived.
    fn connect(&mut self, connection: Arc<ClientConnection>) -> bool {
        self.registry.register(connection.clone());
        gauge!(WS_CONNECTIONS_ACTIVE).set(self.registry.len() as f64);

        let queued = self.queue.len();
        if queued > 0 {
            info!(conn_id = %connection.id, queued, "draining pending commands to new client");
        }

        let target = connection.clone();
        let delivered = self.queue.drain_to(|command| {
            let Some(frame) = encode(command) else {
                // Unserializable command: drop it rather than wedge the queue.
                return true;
            };
            if target.send(frame) {
                target.record_command();
                counter!(COMMANDS_DELIVERED_TOTAL).increment(1);
                true
            } else {
                false
            }
        });

        if !self.queue.is_empty() && delivered < queued {
            warn!(
                conn_id = %connection.id,
                delivered,
                remaining = self.queue.len(),
                "drain aborted, evicting connection"
            );
            self.evict(vec![connection.id.clone()]);
            return false;
        }
        true
    }

    fn stats(&self) -> BridgeStats {
        BridgeStats {
            total_connections: self.registry.len(),
            connected_users: self.registry.connected_users(),
            queued_commands: self.queue.len(),
        }
    }

    fn evict(&mut self, ids: Vec<ConnectionId>) {
        for id in ids {
            self.registry.unregister(&id);
            counter!(CONNECTIONS_EVICTED_TOTAL).increment(1);
        }
        gauge!(WS_CONNECTIONS_ACTIVE).set(self.registry.len() as f64);
    }
}

/// Serialize a command into its wire frame once, shared across recipients.
fn encode(command: &UiCommand) -> Option<Arc<String>> {
    match serde_json::to_string(&command.clone().into_frame()) {
        Ok(json) => Some(Arc::new(json)),
        Err(e) => {
            error!(command_id = %command.id, error = %e, "failed to serialize command");
            None
        }
    }
}

/// Cloneable handle to the delivery worker.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<BridgeRequest>,
}

impl BridgeHandle {
    /// Queue a broadcast for delivery.
    pub async fn broadcast(&self, command: UiCommand) {
        if self.tx.send(BridgeRequest::Broadcast(command)).await.is_err() {
            warn!("delivery worker gone, dropping broadcast");
        }
    }

    /// Queue a targeted send for delivery.
    pub async fn send_to_identity(&self, identity: impl Into<String>, command: UiCommand) {
        let request = BridgeRequest::SendToIdentity {
            identity: identity.into(),
            command,
        };
        if self.tx.send(request).await.is_err() {
            warn!("delivery worker gone, dropping targeted send");
        }
    }

    /// Register a connection and wait for the pending-queue drain.
    ///
    /// Returns `false` if the connection was evicted during the drain or the
    /// worker is gone.
    pub async fn connect(&self, connection: Arc<ClientConnection>) -> bool {
        let (ack, ack_rx) = oneshot::channel();
        let request = BridgeRequest::Connect { connection, ack };
        if self.tx.send(request).await.is_err() {
            return false;
        }
        ack_rx.await.unwrap_or(false)
    }

    /// Remove a connection.
    pub async fn disconnect(&self, id: ConnectionId) {
        let _ = self.tx.send(BridgeRequest::Disconnect(id)).await;
    }

    /// Fetch a state snapshot.
    ///
    /// Returns an empty snapshot if the worker is gone.
    pub async fn stats(&self) -> BridgeStats {
        let (reply, reply_rx) = oneshot::channel();
        if self.tx.send(BridgeRequest::Stats { reply }).await.is_err() {
            return BridgeStats {
                total_connections: 0,
                connected_users: Vec::new(),
                queued_commands: 0,
            };
        }
        reply_rx.await.unwrap_or(BridgeStats {
            total_connections: 0,
            connected_users: Vec::new(),
            queued_commands: 0,
        })
    }
}

#[async_trait]
impl CommandSink for BridgeHandle {
    async fn broadcast(&self, command: UiCommand) {
        Self::broadcast(self, command).await;
    }
}
