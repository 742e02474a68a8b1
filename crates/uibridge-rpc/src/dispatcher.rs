//! Method-routed request dispatch.
//!
//! The protocol has a fixed method set, so routing is an enum match rather
//! than a string-keyed handler table. Every response echoes the request's
//! correlation id unchanged; every failure surfaces as a numeric-coded error
//! object and nothing else is affected.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use serde_json::{Map, Value, json};
use tracing::{info, instrument, warn};

use crate::catalog::ActionCatalog;
use crate::errors::DispatchError;
use crate::resource::{self, ServerIdentity};
use crate::types::{RpcRequest, RpcResponse};

/// Protocol version advertised by `initialize`.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// The fixed protocol method set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum McpMethod {
    /// Static identity/capability metadata.
    Initialize,
    /// Full action catalog listing.
    ToolsList,
    /// Invoke a named action.
    ToolsCall,
    /// List the fixed resources.
    ResourcesList,
    /// Read one resource by URI.
    ResourcesRead,
}

impl McpMethod {
    /// Parse a wire method name. `None` means unknown method.
    pub fn parse(method: &str) -> Option<Self> {
        match method {
            "initialize" => Some(Self::Initialize),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            "resources/list" => Some(Self::ResourcesList),
            "resources/read" => Some(Self::ResourcesRead),
            _ => None,
        }
    }
}

/// Routes control-protocol requests to the catalog and resources.
pub struct Dispatcher {
    identity: ServerIdentity,
    catalog: Arc<ActionCatalog>,
}

impl Dispatcher {
    /// Maximum time a single action handler is allowed to run.
    const ACTION_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a dispatcher over a catalog.
    pub fn new(identity: ServerIdentity, catalog: Arc<ActionCatalog>) -> Self {
        Self { identity, catalog }
    }

    /// The catalog this dispatcher serves.
    pub fn catalog(&self) -> &Arc<ActionCatalog> {
        &self.catalog
    }

    /// The server identity this dispatcher advertises.
    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Handle one request, always producing a well-formed response.
    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn dispatch(&self, request: RpcRequest, user_id: Option<&str>) -> RpcResponse {
        let method = request.method.clone();
        counter!("rpc_requests_total", "method" => method.clone()).increment(1);
        info!(method, user_id, "handling request");

        let start = std::time::Instant::now();
        let result = self.route(&request, user_id).await;
        histogram!("rpc_request_duration_seconds", "method" => method.clone())
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(err) => {
                counter!("rpc_errors_total", "method" => method, "error_type" => err.kind())
                    .increment(1);
                warn!(error = %err, kind = err.kind(), "request failed");
                RpcResponse {
                    jsonrpc: "2.0".to_owned(),
                    id: request.id,
                    result: None,
                    error: Some(err.to_error_body()),
                }
            }
        }
    }

    async fn route(
        &self,
        request: &RpcRequest,
        user_id: Option<&str>,
    ) -> Result<Value, DispatchError> {
        let Some(method) = McpMethod::parse(&request.method) else {
            return Err(DispatchError::UnknownMethod {
                method: request.method.clone(),
            });
        };

        match method {
            McpMethod::Initialize => Ok(self.initialize_result()),
            McpMethod::ToolsList => Ok(json!({ "tools": self.catalog.definitions() })),
            McpMethod::ToolsCall => self.call_action(request.params.as_ref(), user_id).await,
            McpMethod::ResourcesList => Ok(json!({ "resources": resource::resource_listing() })),
            McpMethod::ResourcesRead => self.read_resource(request.params.as_ref()),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": self.identity.name,
                "version": self.identity.version
            }
        })
    }

    async fn call_action(
        &self,
        params: Option<&Value>,
        user_id: Option<&str>,
    ) -> Result<Value, DispatchError> {
        let params = params.and_then(Value::as_object);
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::InvalidParams {
                message: "Missing tool name".to_owned(),
            })?;

        let empty = Map::new();
        let arguments = params
            .and_then(|p| p.get("arguments"))
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let action = self
            .catalog
            .get(name)
            .ok_or_else(|| DispatchError::UnknownAction { name: name.into() })?;

        info!(tool = name, user_id, "executing tool");
        let text = tokio::time::timeout(Self::ACTION_TIMEOUT, action.execute(arguments))
            .await
            .map_err(|_elapsed| {
                tracing::error!(tool = name, "action timed out after {:?}", Self::ACTION_TIMEOUT);
                DispatchError::Internal {
                    message: format!("Tool '{name}' timed out"),
                }
            })??;

        Ok(json!({
            "content": [
                {
                    "type": "text",
                    "text": text
                }
            ]
        }))
    }

    fn read_resource(&self, params: Option<&Value>) -> Result<Value, DispatchError> {
        let uri = params
            .and_then(|p| p.get("uri"))
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::InvalidParams {
                message: "Missing resource URI".to_owned(),
            })?;

        if uri != resource::SERVER_STATUS_URI {
            return Err(DispatchError::UnknownResource { uri: uri.into() });
        }

        let status = resource::server_status(&self.identity, &self.catalog);
        let text = serde_json::to_string_pretty(&status).map_err(|e| DispatchError::Internal {
            message: e.to_string(),
        })?;

        Ok(json!({
            "contents": [
                {
                    "type": "text",
                    "text": text
                }
            ]
        }))
    }
}
