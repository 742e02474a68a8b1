//! Action trait, delivery seam, and the catalog that indexes them.
//!
//! The [`ActionCatalog`] is the fixed, discoverable set of named operations
//! the dispatcher can invoke. Registration order is the order `tools/list`
//! advertises, stable across calls.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use uibridge_core::command::UiCommand;

use crate::errors::DispatchError;

/// Where command-emitting actions hand off their [`UiCommand`].
///
/// The delivery engine implements this behind a channel: the handoff enqueues
/// a broadcast request for the single delivery worker and never touches the
/// connection set directly.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Queue a command for broadcast to all connected clients.
    async fn broadcast(&self, command: UiCommand);
}

/// The trait every named UI action implements.
///
/// Handlers validate their arguments, optionally hand a command to the
/// [`CommandSink`], and return a textual confirmation including the literal
/// arguments used. Validation failures must reject before any command is
/// constructed.
#[async_trait]
pub trait UiAction: Send + Sync {
    /// Action name — the exact string used in `tools/call`.
    fn name(&self) -> &str;

    /// Human-readable description advertised by `tools/list`.
    fn description(&self) -> &str;

    /// JSON Schema for the action's named parameters.
    fn input_schema(&self) -> Value;

    /// Execute with the argument mapping from `tools/call`.
    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError>;
}

/// One catalog entry as advertised by `tools/list`.
#[derive(Clone, Debug, Serialize)]
pub struct ActionDefinition {
    /// Action name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Insertion-ordered index of registered actions.
pub struct ActionCatalog {
    actions: Vec<Arc<dyn UiAction>>,
}

impl ActionCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Register an action. Order of registration is the advertised order.
    pub fn register(&mut self, action: Arc<dyn UiAction>) {
        debug!(action = action.name(), "action registered");
        self.actions.push(action);
    }

    /// Look up an action by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn UiAction>> {
        self.actions.iter().find(|a| a.name() == name).cloned()
    }

    /// Whether an action with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name() == name)
    }

    /// All definitions, in registration order.
    pub fn definitions(&self) -> Vec<ActionDefinition> {
        self.actions
            .iter()
            .map(|a| ActionDefinition {
                name: a.name().to_owned(),
                description: a.description().to_owned(),
                input_schema: a.input_schema(),
            })
            .collect()
    }

    /// All action names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.name().to_owned()).collect()
    }

    /// Number of registered actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::new()
    }
}
