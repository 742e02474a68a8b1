//! UI commands and the WebSocket wire frames that carry them.
//!
//! A [`UiCommand`] is the immutable unit of work the bridge delivers to
//! clients. On the wire it travels inside a [`CommandFrame`] envelope:
//!
//! ```json
//! {"type": "command", "payload": {"id": "...", "type": "clickElement",
//!  "payload": {"selector": "#btn"}, "timestamp": 1756000000000}}
//! ```
//!
//! [`ClientFrame`] and [`ServerFrame`] cover the small control protocol a
//! client speaks over the same socket (ping/pong echo, stats request).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::CommandId;

/// Milliseconds since the Unix epoch.
fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// An immutable instruction destined for connected clients.
///
/// Never mutated after creation; the delivery layer only ever clones or
/// serializes it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UiCommand {
    /// Unique per command. Caller-supplied or system-generated (UUID v7).
    pub id: CommandId,
    /// Action tag identifying what the client should do (e.g. `clickElement`).
    #[serde(rename = "type")]
    pub command_type: String,
    /// Arbitrary structured data; schema depends on `command_type`.
    pub payload: Value,
    /// Milliseconds since epoch, assigned at creation.
    pub timestamp: i64,
}

impl UiCommand {
    /// Create a command with a fresh system-generated ID and the current time.
    pub fn new(command_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id: CommandId::new(),
            command_type: command_type.into(),
            payload,
            timestamp: now_millis(),
        }
    }

    /// Create a command with a caller-supplied ID.
    pub fn with_id(id: CommandId, command_type: impl Into<String>, payload: Value) -> Self {
        Self {
            id,
            command_type: command_type.into(),
            payload,
            timestamp: now_millis(),
        }
    }

    /// Wrap this command in its server→client wire envelope.
    #[must_use]
    pub fn into_frame(self) -> CommandFrame {
        CommandFrame {
            frame_type: "command".to_owned(),
            payload: self,
        }
    }
}

/// Server→client envelope for a [`UiCommand`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommandFrame {
    /// Always `"command"`.
    #[serde(rename = "type")]
    pub frame_type: String,
    /// The command itself.
    pub payload: UiCommand,
}

/// Control frames a client may send over the WebSocket.
///
/// Any other `type` value (or non-JSON text) is logged and ignored by the
/// session loop — it never closes the connection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Liveness probe; the server echoes the timestamp back unchanged.
    Ping {
        /// Caller-supplied value, echoed verbatim in the pong.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<Value>,
    },
    /// Request for the bridge's connection statistics.
    Status,
}

/// Control frames the server sends in reply to a [`ClientFrame`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Reply to [`ClientFrame::Ping`], echoing the original timestamp.
    Pong {
        /// The value the client sent, unchanged.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp: Option<Value>,
    },
    /// Reply to [`ClientFrame::Status`].
    Stats {
        /// Registry statistics document.
        data: Value,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
