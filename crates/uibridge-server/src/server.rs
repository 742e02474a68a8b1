//! `BridgeServer` — axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use uibridge_rpc::dispatcher::Dispatcher;
use uibridge_rpc::errors::INTERNAL_ERROR;
use uibridge_rpc::types::{RpcRequest, RpcResponse};

use crate::config::BridgeConfig;
use crate::health;
use crate::shutdown::ShutdownCoordinator;
use crate::ws::delivery::BridgeHandle;
use crate::ws::session::run_ws_session;

/// Shared state accessible from axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Handle to the delivery worker.
    pub bridge: BridgeHandle,
    /// The control-protocol dispatcher.
    pub dispatcher: Arc<Dispatcher>,
    /// Server configuration.
    pub config: Arc<BridgeConfig>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle (absent in some tests).
    pub prometheus: Option<PrometheusHandle>,
}

/// The bridge server.
pub struct BridgeServer {
    state: AppState,
}

impl BridgeServer {
    /// Create a new server.
    pub fn new(
        config: BridgeConfig,
        bridge: BridgeHandle,
        dispatcher: Dispatcher,
        prometheus: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            state: AppState {
                bridge,
                dispatcher: Arc::new(dispatcher),
                config: Arc::new(config),
                shutdown: Arc::new(ShutdownCoordinator::new()),
                start_time: Instant::now(),
                prometheus,
            },
        }
    }

    /// Build the axum router with all routes.
    ///
    /// CORS is fully permissive; the original surface allowed any origin and
    /// the bridge performs no connection auth.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/mcp", get(ws_handler).post(mcp_post_handler))
            .route("/mcp/stats", get(stats_handler))
            .route("/metrics", get(metrics_handler))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.state.config
    }

    /// Bind and start serving.
    ///
    /// Returns the bound address and the serve task's join handle; the task
    /// exits when the shutdown coordinator fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let bind = format!("{}:{}", self.state.config.host, self.state.config.port);
        let listener = tokio::net::TcpListener::bind(&bind).await?;
        let addr = listener.local_addr()?;

        let router = self.router();
        let token = self.state.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });

        info!(%addr, "bridge server listening");
        Ok((addr, handle))
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<health::HealthResponse> {
    let stats = state.bridge.stats().await;
    Json(health::health_check(
        &state.config.server_name,
        state.start_time,
        stats.total_connections,
    ))
}

/// GET /mcp/stats
async fn stats_handler(State(state): State<AppState>) -> Response {
    let stats = state.bridge.stats().await;
    Json(stats).into_response()
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state
        .prometheus
        .as_ref()
        .map(crate::metrics::render)
        .unwrap_or_default()
}

/// Query parameters accepted by the WebSocket endpoint.
#[derive(Debug, Deserialize)]
struct WsParams {
    /// Optional identity tag for targeted delivery. Not verified.
    user_id: Option<String>,
}

/// GET /mcp — WebSocket upgrade.
async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let heartbeat_interval = Duration::from_secs(state.config.heartbeat_interval_secs);
    let heartbeat_timeout = Duration::from_secs(state.config.heartbeat_timeout_secs);
    let queue_capacity = state.config.queue_capacity;
    let bridge = state.bridge.clone();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| {
            run_ws_session(
                socket,
                params.user_id,
                bridge,
                queue_capacity,
                heartbeat_interval,
                heartbeat_timeout,
            )
        })
}

/// POST /mcp — the control-protocol dispatcher endpoint.
///
/// The optional `User-ID` header is threaded into action execution for
/// logging; it grants nothing.
async fn mcp_post_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Json<RpcResponse> {
    let user_id = headers.get("User-ID").and_then(|v| v.to_str().ok());

    let Ok(value) = serde_json::from_str::<Value>(&body) else {
        warn!("malformed request body on dispatcher endpoint");
        return Json(RpcResponse::error(
            Value::Null,
            INTERNAL_ERROR,
            "Invalid JSON in request body",
        ));
    };

    // Parse the envelope shape separately so a present correlation id is
    // still echoed when the request is otherwise malformed.
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(_) => {
            warn!("malformed request envelope on dispatcher endpoint");
            return Json(RpcResponse::error(
                id,
                INTERNAL_ERROR,
                "Invalid JSON in request body",
            ));
        }
    };

    Json(state.dispatcher.dispatch(request, user_id).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use uibridge_rpc::actions::register_all;
    use uibridge_rpc::catalog::ActionCatalog;
    use uibridge_rpc::resource::ServerIdentity;

    use crate::ws::delivery::CommandBridge;

    fn make_server() -> (BridgeServer, BridgeHandle) {
        let (bridge, _worker) = CommandBridge::spawn(100);
        let mut catalog = ActionCatalog::new();
        register_all(&mut catalog, Arc::new(bridge.clone()));
        let dispatcher = Dispatcher::new(
            ServerIdentity::new("uibridge", false, "info"),
            Arc::new(catalog),
        );
        let server = BridgeServer::new(BridgeConfig::default(), bridge.clone(), dispatcher, None);
        (server, bridge)
    }

    async fn body_json(resp: Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_mcp(payload: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["status"], "healthy");
        assert_eq!(parsed["server"], "uibridge");
        assert_eq!(parsed["transport"], "streamable_http");
        assert_eq!(parsed["connections"], 0);
    }

    #[tokio::test]
    async fn stats_endpoint_empty_bridge() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/mcp/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["total_connections"], 0);
        assert_eq!(parsed["queued_commands"], 0);
        assert_eq!(parsed["connected_users"], json!([]));
    }

    #[tokio::test]
    async fn metrics_endpoint_without_recorder() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mcp_post_initialize() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(post_mcp(
                r#"{"jsonrpc": "2.0", "id": 1, "method": "initialize"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["jsonrpc"], "2.0");
        assert_eq!(parsed["id"], 1);
        assert_eq!(parsed["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(parsed["result"]["serverInfo"]["name"], "uibridge");
    }

    #[tokio::test]
    async fn mcp_post_invalid_json_gets_null_id_error() {
        let (server, _bridge) = make_server();
        let resp = server.router().oneshot(post_mcp("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["id"], Value::Null);
        assert_eq!(parsed["error"]["code"], -32603);
        assert_eq!(parsed["error"]["message"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn mcp_post_missing_method_echoes_id() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(post_mcp(r#"{"jsonrpc": "2.0", "id": 5}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["id"], 5);
        assert_eq!(parsed["error"]["code"], -32603);
        assert_eq!(parsed["error"]["message"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn mcp_post_tools_call_queues_command() {
        let (server, bridge) = make_server();
        let resp = server
            .router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .header("User-ID", "alice")
                    .body(Body::from(
                        json!({
                            "jsonrpc": "2.0",
                            "id": "c1",
                            "method": "tools/call",
                            "params": {
                                "name": "click_element",
                                "arguments": {"selector": "#go"}
                            }
                        })
                        .to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["id"], "c1");
        assert_eq!(
            parsed["result"]["content"][0]["text"],
            "Element '#go' clicked successfully"
        );

        // No client connected: the command landed in the pending queue.
        assert_eq!(bridge.stats().await.queued_commands, 1);
    }

    #[tokio::test]
    async fn mcp_post_unknown_method() {
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(post_mcp(
                r#"{"jsonrpc": "2.0", "id": 7, "method": "tools/erase"}"#,
            ))
            .await
            .unwrap();

        let parsed = body_json(resp.into_response()).await;
        assert_eq!(parsed["id"], 7);
        assert_eq!(parsed["error"]["code"], -32603);
        assert_eq!(parsed["error"]["message"], "Unknown method: tools/erase");
    }

    #[tokio::test]
    async fn ws_route_rejects_plain_get() {
        // Without upgrade headers the WebSocket route refuses the request.
        let (server, _bridge) = make_server();
        let resp = server
            .router()
            .oneshot(Request::builder().uri("/mcp").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_ne!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn listen_binds_and_shuts_down() {
        let (bridge, _worker) = CommandBridge::spawn(100);
        let mut catalog = ActionCatalog::new();
        register_all(&mut catalog, Arc::new(bridge.clone()));
        let dispatcher = Dispatcher::new(
            ServerIdentity::new("uibridge", false, "info"),
            Arc::new(catalog),
        );
        let config = BridgeConfig {
            host: "127.0.0.1".into(),
            port: 0,
            ..BridgeConfig::default()
        };
        let server = BridgeServer::new(config, bridge, dispatcher, None);

        let (addr, handle) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);

        server.shutdown().shutdown();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("shutdown timed out")
            .expect("join error");
    }
}
