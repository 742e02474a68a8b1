//! Shutdown coordination for the serve loop and the delivery worker.
//!
//! The bridge runs two long-lived tasks: the axum serve loop (watches the
//! cancellation token) and the delivery worker (exits once every
//! `BridgeHandle` is dropped). [`ShutdownCoordinator::graceful_shutdown`]
//! cancels the token, gives both tasks a shared deadline to finish, and
//! aborts anything still running past it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Time budget for shutdown before stragglers are aborted.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Owns the cancellation token the server tasks watch.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a coordinator with an uncancelled token.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Clone of the cancellation token for a task to watch.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Signal shutdown. Idempotent.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has been signalled.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Signal shutdown, then join `handles` against a shared deadline.
    ///
    /// A task that has not finished by the deadline is aborted; the bridge
    /// must not hang on a wedged socket or worker during exit.
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);

        self.shutdown();
        info!(
            tasks = handles.len(),
            timeout_secs = timeout.as_secs(),
            "stopping server tasks"
        );

        let deadline = tokio::time::Instant::now() + timeout;
        for mut handle in handles {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                warn!("task did not stop before the shutdown deadline, aborting it");
                handle.abort();
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
