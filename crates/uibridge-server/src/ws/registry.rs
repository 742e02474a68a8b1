//! The connection registry: the authoritative set of live clients.
//!
//! Not internally synchronized. The registry is owned by the single delivery
//! worker ([`super::delivery::CommandBridge`]); every mutation and every
//! snapshot happens on that worker, so no lock is needed. Handlers and
//! sessions talk to it through the worker's channel.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use uibridge_core::ids::ConnectionId;

use super::connection::ClientConnection;

/// Per-connection summary exposed by [`ConnectionRegistry::stats`].
#[derive(Clone, Debug, Serialize)]
pub struct ConnectedUser {
    /// The identity tag, or `"anonymous"` when none was supplied.
    pub user_id: String,
    /// RFC 3339 connection time.
    pub connected_at: String,
    /// Commands delivered so far.
    pub commands_sent: u64,
}

/// Tracks live connections in registration order.
pub struct ConnectionRegistry {
    connections: Vec<Arc<ClientConnection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
        }
    }

    /// Add a connection.
    pub fn register(&mut self, connection: Arc<ClientConnection>) {
        info!(
            conn_id = %connection.id,
            identity = connection.identity.as_deref(),
            "client registered"
        );
        self.connections.push(connection);
    }

    /// Remove a connection by ID. Idempotent.
    pub fn unregister(&mut self, id: &ConnectionId) {
        let before = self.connections.len();
        self.connections.retain(|c| &c.id != id);
        if self.connections.len() < before {
            debug!(conn_id = %id, "client unregistered");
        }
    }

    /// Point-in-time copy of every connection, in registration order.
    ///
    /// Delivery iterates this copy, never the live vector, so eviction during
    /// fan-out cannot invalidate an in-flight iteration.
    pub fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.clone()
    }

    /// Connections whose identity exactly equals `identity`.
    ///
    /// An empty identity matches nothing.
    pub fn find(&self, identity: &str) -> Vec<Arc<ClientConnection>> {
        if identity.is_empty() {
            return Vec::new();
        }
        self.connections
            .iter()
            .filter(|c| c.identity.as_deref() == Some(identity))
            .cloned()
            .collect()
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Read-only per-connection summaries.
    pub fn connected_users(&self) -> Vec<ConnectedUser> {
        self.connections
            .iter()
            .map(|c| ConnectedUser {
                user_id: c
                    .identity
                    .clone()
                    .unwrap_or_else(|| "anonymous".to_owned()),
                connected_at: c.connected_at.to_rfc3339(),
                commands_sent: c.commands_sent(),
            })
            .collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
