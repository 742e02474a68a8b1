//! `/health` endpoint.

use serde::Serialize;
use std::time::Instant;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server is running.
    pub status: String,
    /// Configured server name.
    pub server: String,
    /// Crate version.
    pub version: String,
    /// Transport the dispatcher speaks.
    pub transport: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Current WebSocket connection count.
    pub connections: usize,
}

/// Build a health response from live counters.
pub fn health_check(server: &str, start_time: Instant, connections: usize) -> HealthResponse {
    HealthResponse {
        status: "healthy".into(),
        server: server.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        transport: "streamable_http".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        connections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_healthy() {
        let resp = health_check("uibridge", Instant::now(), 0);
        assert_eq!(resp.status, "healthy");
        assert_eq!(resp.server, "uibridge");
        assert_eq!(resp.transport, "streamable_http");
    }

    #[test]
    fn uptime_starts_at_zero() {
        let resp = health_check("uibridge", Instant::now(), 0);
        assert!(resp.uptime_secs < 2);
    }

    #[test]
    fn uptime_increases() {
        let start = Instant::now()
            .checked_sub(std::time::Duration::from_secs(60))
            .unwrap();
        let resp = health_check("uibridge", start, 0);
        assert!(resp.uptime_secs >= 59);
    }

    #[test]
    fn serialization() {
        let resp = health_check("uibridge", Instant::now(), 2);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["server"], "uibridge");
        assert_eq!(json["transport"], "streamable_http");
        assert_eq!(json["connections"], 2);
        assert!(json["version"].is_string());
        assert!(json["uptime_secs"].is_number());
    }
}
