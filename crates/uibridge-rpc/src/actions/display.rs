//! Display actions: component updates, notifications, and navigation.
//!
//! All three emit a command. Validation rejects before any command is
//! constructed, so a failed call never reaches the delivery engine.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::info;

use uibridge_core::command::UiCommand;

use crate::actions::args::{optional_bool, optional_i64, optional_object, optional_str, require_str};
use crate::catalog::{CommandSink, UiAction};
use crate::errors::DispatchError;

const NOTIFICATION_TYPES: [&str; 4] = ["info", "success", "warning", "error"];

/// `update_ui` — emits an `updateUI` command.
pub struct UpdateUiAction {
    sink: Arc<dyn CommandSink>,
}

impl UpdateUiAction {
    /// Create the action with its delivery seam.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl UiAction for UpdateUiAction {
    fn name(&self) -> &str {
        "update_ui"
    }

    fn description(&self) -> &str {
        "Update a UI component with the specified action"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "component": {"type": "string", "description": "Name of the UI component to update"},
                "action": {"type": "string", "description": "Action to perform on the component"},
                "data": {"type": "object", "description": "Optional additional data for the update"}
            },
            "required": ["component", "action"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let component = require_str(arguments, "component")?;
        let action = require_str(arguments, "action")?;
        let data = optional_object(arguments, "data")?.cloned();

        info!(component, action, "updating UI component");
        let command = UiCommand::new(
            "updateUI",
            json!({
                "component": component,
                "action": action,
                "data": data,
            }),
        );
        self.sink.broadcast(command).await;

        let data_info = match &data {
            Some(d) if !d.is_empty() => format!(
                " with data: {}",
                serde_json::to_string(d).unwrap_or_default()
            ),
            _ => String::new(),
        };
        Ok(format!(
            "UI component '{component}' updated with action '{action}'{data_info}"
        ))
    }
}

/// `show_notification` — emits a `showNotification` command.
pub struct ShowNotificationAction {
    sink: Arc<dyn CommandSink>,
}

impl ShowNotificationAction {
    /// Create the action with its delivery seam.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl UiAction for ShowNotificationAction {
    fn name(&self) -> &str {
        "show_notification"
    }

    fn description(&self) -> &str {
        "Display a notification to the user"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "The notification message to display"},
                "notification_type": {"type": "string", "description": "Type of notification", "default": "info"},
                "duration": {"type": "integer", "description": "Duration in milliseconds", "default": 3000}
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let message = require_str(arguments, "message")?;
        let notification_type = optional_str(arguments, "notification_type")?.unwrap_or("info");
        let duration = optional_i64(arguments, "duration")?.unwrap_or(3000);

        // Reject before any command is constructed.
        if !NOTIFICATION_TYPES.contains(&notification_type) {
            return Err(DispatchError::InvalidParams {
                message: format!(
                    "Notification type must be one of: {}",
                    NOTIFICATION_TYPES.join(", ")
                ),
            });
        }

        info!(notification_type, message, "showing notification");
        let command = UiCommand::new(
            "showNotification",
            json!({
                "message": message,
                "type": notification_type,
                "duration": duration,
            }),
        );
        self.sink.broadcast(command).await;

        Ok(format!(
            "Notification displayed: '{message}' (type: {notification_type}, duration: {duration}ms)"
        ))
    }
}

/// `navigate_to` — emits a `navigateTo` command.
pub struct NavigateToAction {
    sink: Arc<dyn CommandSink>,
}

impl NavigateToAction {
    /// Create the action with its delivery seam.
    pub fn new(sink: Arc<dyn CommandSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl UiAction for NavigateToAction {
    fn name(&self) -> &str {
        "navigate_to"
    }

    fn description(&self) -> &str {
        "Navigate to a specific path in the application"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "The path to navigate to"},
                "replace": {"type": "boolean", "description": "Whether to replace the current history entry", "default": false}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String, DispatchError> {
        let path = require_str(arguments, "path")?;
        let replace = optional_bool(arguments, "replace")?.unwrap_or(false);

        info!(path, replace, "navigating");
        let command = UiCommand::new(
            "navigateTo",
            json!({
                "path": path,
                "replace": replace,
            }),
        );
        self.sink.broadcast(command).await;

        let verb = if replace {
            "Replaced navigation to"
        } else {
            "Navigated to"
        };
        Ok(format!("{verb} '{path}' successfully"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::RecordingSink;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn update_ui_broadcasts_and_confirms() {
        let sink = RecordingSink::new();
        let action = UpdateUiAction::new(sink.clone());

        let result = action
            .execute(&args(json!({"component": "cart", "action": "refresh"})))
            .await
            .unwrap();

        assert_eq!(result, "UI component 'cart' updated with action 'refresh'");
        let sent = sink.broadcasts();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].command_type, "updateUI");
        assert_eq!(sent[0].payload["component"], "cart");
        assert!(sent[0].payload["data"].is_null());
    }

    #[tokio::test]
    async fn update_ui_mentions_data_when_present() {
        let sink = RecordingSink::new();
        let action = UpdateUiAction::new(sink.clone());

        let result = action
            .execute(&args(json!({
                "component": "cart",
                "action": "refresh",
                "data": {"count": 3}
            })))
            .await
            .unwrap();

        assert!(result.contains(" with data: "));
        assert!(result.contains("\"count\":3"));
    }

    #[tokio::test]
    async fn show_notification_defaults() {
        let sink = RecordingSink::new();
        let action = ShowNotificationAction::new(sink.clone());

        let result = action
            .execute(&args(json!({"message": "Saved"})))
            .await
            .unwrap();

        assert_eq!(
            result,
            "Notification displayed: 'Saved' (type: info, duration: 3000ms)"
        );
        let sent = sink.broadcasts();
        assert_eq!(sent[0].command_type, "showNotification");
        assert_eq!(sent[0].payload["type"], "info");
        assert_eq!(sent[0].payload["duration"], 3000);
    }

    #[tokio::test]
    async fn show_notification_rejects_unknown_type_before_emitting() {
        let sink = RecordingSink::new();
        let action = ShowNotificationAction::new(sink.clone());

        let err = action
            .execute(&args(
                json!({"message": "Saved", "notification_type": "bogus"}),
            ))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Notification type must be one of: info, success, warning, error"
        );
        assert!(sink.broadcasts().is_empty(), "no command may be emitted");
    }

    #[tokio::test]
    async fn navigate_to_push() {
        let sink = RecordingSink::new();
        let action = NavigateToAction::new(sink.clone());

        let result = action
            .execute(&args(json!({"path": "/checkout"})))
            .await
            .unwrap();

        assert_eq!(result, "Navigated to '/checkout' successfully");
        let sent = sink.broadcasts();
        assert_eq!(sent[0].command_type, "navigateTo");
        assert_eq!(sent[0].payload["replace"], false);
    }

    #[tokio::test]
    async fn navigate_to_replace() {
        let sink = RecordingSink::new();
        let action = NavigateToAction::new(sink.clone());

        let result = action
            .execute(&args(json!({"path": "/login", "replace": true})))
            .await
            .unwrap();

        assert_eq!(result, "Replaced navigation to '/login' successfully");
        assert_eq!(sink.broadcasts()[0].payload["replace"], true);
    }
}
