//! Heartbeat liveness monitoring.
//!
//! The session loop marks the connection alive on every pong (and any other
//! inbound frame); this watchdog checks the flag each interval and declares
//! the connection dead after `timeout / interval` consecutive misses.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use super::connection::ClientConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The client stopped responding within the timeout window.
    TimedOut,
    /// The heartbeat was cancelled externally (session ended first).
    Cancelled,
}

/// Watch a connection's liveness until timeout or cancellation.
pub async fn run_heartbeat(
    connection: Arc<ClientConnection>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut check_interval = time::interval(interval);
    // Skip the immediate first tick
    let _ = check_interval.tick().await;

    let mut missed: u32 = 0;
    let interval_secs = interval.as_secs().max(1);
    #[allow(clippy::cast_possible_truncation)]
    let max_missed = (timeout.as_secs() / interval_secs).max(1) as u32;

    loop {
        tokio::select! {
            _ = check_interval.tick() => {
                if connection.check_alive() {
                    missed = 0;
                } else {
                    missed += 1;
                    if missed >= max_missed {
                        return HeartbeatResult::TimedOut;
                    }
                }
                // Not alive again until the next inbound frame.
                connection.is_alive.store(false, Ordering::Relaxed);
            }
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use uibridge_core::ids::ConnectionId;

    fn make_connection() -> Arc<ClientConnection> {
        let (tx, _rx) = mpsc::channel(32);
        Arc::new(ClientConnection::new(ConnectionId::new(), None, tx))
    }

    #[tokio::test]
    async fn heartbeat_cancelled() {
        let conn = make_connection();
        let cancel = CancellationToken::new();
        let cancel2 = cancel.clone();

        let handle = tokio::spawn(async move {
            run_heartbeat(
                conn,
                Duration::from_secs(100),
                Duration::from_secs(300),
                cancel2,
            )
            .await
        });

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_connection_times_out() {
        let conn = make_connection();
        conn.is_alive.store(false, Ordering::Relaxed);
        let cancel = CancellationToken::new();

        let result = run_heartbeat(
            conn,
            Duration::from_secs(30),
            Duration::from_secs(90),
            cancel,
        )
        .await;

        assert_eq!(result, HeartbeatResult::TimedOut);
    }

    #[tokio::test]
    async fn responsive_connection_stays_alive() {
        let conn = make_connection();
        let conn2 = conn.clone();
        let cancel = CancellationToken::new();
        let cancel2 = cancel.clone();

        let handle = tokio::spawn(async move {
            run_heartbeat(
                conn2,
                Duration::from_millis(50),
                Duration::from_millis(200),
                cancel2,
            )
            .await
        });

        // Keep answering for a few ticks, then end the session.
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            conn.mark_alive();
        }
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn max_missed_computed_from_timeout_and_interval() {
        // timeout 90s / interval 30s = 3 consecutive misses before eviction.
        let conn = make_connection();
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();

        conn.is_alive.store(false, Ordering::Relaxed);
        let result = run_heartbeat(
            conn,
            Duration::from_secs(30),
            Duration::from_secs(90),
            cancel,
        )
        .await;

        assert_eq!(result, HeartbeatResult::TimedOut);
        assert!(start.elapsed() >= Duration::from_secs(90));
    }
}
