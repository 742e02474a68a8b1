//! Element interaction actions: clicking, form filling, and tab swipes.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::info;

use uibridge_core::command::UiCommand;

use crate::actions::args::{optional_str, require_object, require_str};
use crate::catalog::{CommandSink, UiAction};
use crate::errors::DispatchError;

/// `click_element` — emits a `clickElement` command to all clients.
pub struct ClickElementAction {
    sink: Arc<dyn CommandSink>,
}

impl ClickElementAction {
    /// Create the action with its delivery seam.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl UiAction for ClickElementAction {
    fn name(&self) -> &str {
        "click_element"
    }

    fn description(&self) -> &str {
        "Click on a UI element using CSS selector"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "selector": {"type": "string", "description": "CSS selector for the element to click"}
            },
            "required": ["selector"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let selector = require_str(arguments, "selector")?;

        info!(selector, "clicking element");
        let command = UiCommand::new("clickElement", json!({"selector": selector}));
        self.sink.broadcast(command).await;

        Ok(format!("Element '{selector}' clicked successfully"))
    }
}

/// `fill_form` — pure response; confirms which fields would be filled.
pub struct FillFormAction;

#[async_trait]
impl UiAction for FillFormAction {
    fn name(&self) -> &str {
        "fill_form"
    }

    fn description(&self) -> &str {
        "Fill a form with the provided data"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "fields": {"type": "object", "description": "Dictionary mapping field names to values"},
                "form_selector": {"type": "string", "description": "CSS selector for the form", "default": "form"}
            },
            "required": ["fields"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let fields = require_object(arguments, "fields")?;
        let form_selector = optional_str(arguments, "form_selector")?.unwrap_or("form");

        info!(form_selector, field_count = fields.len(), "filling form");
        let field_names = fields.keys().cloned().collect::<Vec<_>>().join(", ");
        Ok(format!(
            "Form '{form_selector}' filled successfully with fields: {field_names}"
        ))
    }
}

/// `swipe_tab` — pure response; validates the swipe direction.
pub struct SwipeTabAction;

#[async_trait]
impl UiAction for SwipeTabAction {
    fn name(&self) -> &str {
        "swipe_tab"
    }

    fn description(&self) -> &str {
        "Swipe to navigate between tabs"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tab_name": {"type": "string", "description": "Name of the tab to navigate to"},
                "direction": {"type": "string", "description": "Swipe direction", "default": "right"}
            },
            "required": ["tab_name"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let tab_name = require_str(arguments, "tab_name")?;
        let direction = optional_str(arguments, "direction")?.unwrap_or("right");

        if direction != "left" && direction != "right" {
            return Err(DispatchError::InvalidParams {
                message: "Direction must be 'left' or 'right'".to_owned(),
            });
        }

        info!(tab_name, direction, "swiping tab");
        Ok(format!("Swiped {direction} to tab '{tab_name}' successfully"))
    }
}
