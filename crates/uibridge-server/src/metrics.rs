//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Names for the metrics this crate records, shared by the delivery and
// session modules.

/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// WebSocket connection duration seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
/// Commands delivered to clients total (counter).
pub const COMMANDS_DELIVERED_TOTAL: &str = "commands_delivered_total";
/// Commands queued while no client was connected total (counter).
pub const COMMANDS_QUEUED_TOTAL: &str = "commands_queued_total";
/// Commands evicted from the full pending queue total (counter).
pub const COMMANDS_EVICTED_TOTAL: &str = "commands_evicted_total";
/// Connections evicted after a failed send total (counter).
pub const CONNECTIONS_EVICTED_TOTAL: &str = "connections_evicted_total";
/// Pending queue depth (gauge).
pub const QUEUE_DEPTH: &str = "queue_depth";
