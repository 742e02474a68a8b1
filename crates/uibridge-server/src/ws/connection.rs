//! WebSocket client connection state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use uibridge_core::ids::ConnectionId;

/// Represents a connected WebSocket client.
pub struct ClientConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Caller-supplied identity tag (`user_id` query parameter). Not verified.
    pub identity: Option<String>,
    /// Send channel to the client's WebSocket write task.
    tx: mpsc::Sender<Arc<String>>,
    /// Wall-clock time this connection was established (RFC 3339 in stats).
    pub connected_at: chrono::DateTime<chrono::Utc>,
    /// Monotonic clock for connection age.
    established: Instant,
    /// Commands successfully handed to this connection's writer.
    commands_sent: AtomicU64,
    /// Whether the client has responded since the last heartbeat check.
    pub is_alive: AtomicBool,
    /// When the last pong (or any activity) was received.
    last_pong: Mutex<Instant>,
}

impl ClientConnection {
    /// Create a new connection.
    pub fn new(id: ConnectionId, identity: Option<String>, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            identity,
            tx,
            connected_at: chrono::Utc::now(),
            established: now,
            commands_sent: AtomicU64::new(0),
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
        }
    }

    /// Send a pre-serialized text frame to the client.
    ///
    /// Returns `false` if the writer channel is full or closed — a slow or
    /// dead client. The caller decides whether that evicts the connection.
    pub fn send(&self, message: Arc<String>) -> bool {
        self.tx.try_send(message).is_ok()
    }

    /// Record one successful command delivery.
    pub fn record_command(&self) {
        let _ = self.commands_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Total commands delivered to this connection.
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent.load(Ordering::Relaxed)
    }

    /// Mark the connection as alive (pong or any frame received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Check and reset the alive flag for heartbeat.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.established.elapsed()
    }
}
