//! The one fixed read-only resource: `config://server-status`.

use serde_json::{Value, json};

use crate::catalog::ActionCatalog;

/// URI of the server-status resource.
pub const SERVER_STATUS_URI: &str = "config://server-status";

/// Static server identity surfaced by `initialize` and the status resource.
#[derive(Clone, Debug)]
pub struct ServerIdentity {
    /// Server name (default `uibridge`).
    pub name: String,
    /// Server version string.
    pub version: String,
    /// Whether debug mode is on.
    pub debug: bool,
    /// Configured log level.
    pub log_level: String,
}

impl ServerIdentity {
    /// Identity from configured name/debug/log-level, version from the crate.
    pub fn new(name: impl Into<String>, debug: bool, log_level: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            debug,
            log_level: log_level.into(),
        }
    }
}

/// The `resources/list` entry for the status resource.
pub fn resource_listing() -> Value {
    json!([
        {
            "uri": SERVER_STATUS_URI,
            "name": "Server Status",
            "description": "Current server status and configuration"
        }
    ])
}

/// The status document itself.
///
/// Tool count and names come from the live catalog, in advertised order, so
/// the document can never drift from `tools/list`.
pub fn server_status(identity: &ServerIdentity, catalog: &ActionCatalog) -> Value {
    json!({
        "status": "running",
        "name": identity.name,
        "version": identity.version,
        "debug_mode": identity.debug,
        "log_level": identity.log_level,
        "transport": "streamable_http",
        "tools_count": catalog.len(),
        "available_tools": catalog.names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::register_all;
    use crate::actions::test_support::RecordingSink;

    fn full_catalog() -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        register_all(&mut catalog, RecordingSink::new());
        catalog
    }

    #[test]
    fn listing_has_one_resource() {
        let listing = resource_listing();
        let entries = listing.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["uri"], SERVER_STATUS_URI);
        assert_eq!(entries[0]["name"], "Server Status");
    }

    #[test]
    fn status_reflects_catalog() {
        let identity = ServerIdentity::new("uibridge", false, "info");
        let catalog = full_catalog();

        let doc = server_status(&identity, &catalog);
        assert_eq!(doc["status"], "running");
        assert_eq!(doc["name"], "uibridge");
        assert_eq!(doc["transport"], "streamable_http");
        assert_eq!(doc["tools_count"], 9);
        assert_eq!(doc["available_tools"][0], "add_product");
        assert_eq!(doc["available_tools"][8], "navigate_to");
    }

    #[test]
    fn status_carries_debug_and_log_level() {
        let identity = ServerIdentity::new("uibridge", true, "debug");
        let doc = server_status(&identity, &ActionCatalog::new());
        assert_eq!(doc["debug_mode"], true);
        assert_eq!(doc["log_level"], "debug");
        assert_eq!(doc["tools_count"], 0);
    }
}
