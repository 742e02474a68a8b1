//! Bridge configuration.
//!
//! Loading flow:
//! 1. Start with compiled [`BridgeConfig::default()`]
//! 2. If a JSON config file exists, deep-merge its values over defaults
//! 3. Apply `UIBRIDGE_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The config file contained invalid JSON or mismatched types.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for the bridge server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Host to bind (default `"0.0.0.0"`).
    pub host: String,
    /// Port to bind (default `8001`).
    pub port: u16,
    /// Server name advertised in `initialize` and the status resource.
    pub server_name: String,
    /// Log level for the tracing subscriber.
    pub log_level: String,
    /// Debug mode flag, surfaced in the status resource.
    pub debug: bool,
    /// Maximum commands held while no client is connected (drop-oldest).
    pub queue_capacity: usize,
    /// Heartbeat ping interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Heartbeat timeout in seconds (disconnect after this long without a pong).
    pub heartbeat_timeout_secs: u64,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8001,
            server_name: "uibridge".into(),
            log_level: "info".into(),
            debug: false,
            queue_capacity: 100,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 16 * 1024 * 1024, // 16 MB
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a specific path with env var overrides.
    ///
    /// If the file does not exist, returns defaults (still applying env
    /// overrides). If the file contains invalid JSON, returns an error.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let defaults = serde_json::to_value(Self::default())?;

        let merged = if path.exists() {
            debug!(?path, "loading config from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        } else {
            debug!(?path, "config file not found, using defaults");
            defaults
        };

        let mut config: Self = serde_json::from_value(merged)?;
        apply_env_overrides(&mut config);
        Ok(config)
    }
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to a loaded config.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Booleans accept: `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`
/// - Invalid values are logged and ignored (fall back to file/default)
pub fn apply_env_overrides(config: &mut BridgeConfig) {
    if let Some(v) = read_env_string("UIBRIDGE_HOST") {
        config.host = v;
    }
    if let Some(v) = read_env_u16("UIBRIDGE_PORT", 1, 65535) {
        config.port = v;
    }
    if let Some(v) = read_env_string("UIBRIDGE_SERVER_NAME") {
        config.server_name = v;
    }
    if let Some(v) = read_env_string("UIBRIDGE_LOG_LEVEL") {
        config.log_level = v;
    }
    if let Some(v) = read_env_bool("UIBRIDGE_DEBUG") {
        config.debug = v;
    }
    if let Some(v) = read_env_usize("UIBRIDGE_QUEUE_CAPACITY", 1, 100_000) {
        config.queue_capacity = v;
    }
    if let Some(v) = read_env_u64("UIBRIDGE_HEARTBEAT_INTERVAL", 1, 600) {
        config.heartbeat_interval_secs = v;
    }
    if let Some(v) = read_env_u64("UIBRIDGE_HEARTBEAT_TIMEOUT", 1, 3600) {
        config.heartbeat_timeout_secs = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let val = std::env::var(name).ok()?;
    let result = parse_usize_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid usize env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── defaults ────────────────────────────────────────────────────

    #[test]
    fn default_bind() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8001);
    }

    #[test]
    fn default_identity() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.server_name, "uibridge");
        assert_eq!(cfg.log_level, "info");
        assert!(!cfg.debug);
    }

    #[test]
    fn default_queue_capacity() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.queue_capacity, 100);
    }

    #[test]
    fn default_heartbeat() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.heartbeat_interval_secs, 30);
        assert_eq!(cfg.heartbeat_timeout_secs, 90);
    }

    #[test]
    fn default_max_message_size() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.max_message_size, 16 * 1024 * 1024);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = BridgeConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: BridgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.queue_capacity, cfg.queue_capacity);
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_simple_override() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": 10});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 10);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({"server": {"port": 8001, "host": "0.0.0.0"}});
        let source = serde_json::json!({"server": {"port": 9090}});
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["port"], 9090);
        assert_eq!(merged["server"]["host"], "0.0.0.0");
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4]));
    }

    #[test]
    fn merge_new_keys_added() {
        let target = serde_json::json!({"a": 1});
        let source = serde_json::json!({"b": 2});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    // ── load_from_path ──────────────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let cfg = BridgeConfig::load_from_path(Path::new("/nonexistent/uibridge.json")).unwrap();
        assert_eq!(cfg.port, 8001);
        assert_eq!(cfg.queue_capacity, 100);
    }

    #[test]
    fn load_empty_json_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uibridge.json");
        std::fs::write(&path, "{}").unwrap();

        let cfg = BridgeConfig::load_from_path(&path).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8001);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uibridge.json");
        std::fs::write(&path, r#"{"port": 9090, "queue_capacity": 10}"#).unwrap();

        let cfg = BridgeConfig::load_from_path(&path).unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.queue_capacity, 10);
        // untouched keys keep defaults
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.heartbeat_interval_secs, 30);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uibridge.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = BridgeConfig::load_from_path(&path);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    // ── parse helpers ───────────────────────────────────────────────

    #[test]
    fn parse_bool_true_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "Yes", "ON"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
    }

    #[test]
    fn parse_bool_false_variants() {
        for val in &["false", "0", "no", "off", "FALSE", "No", "OFF"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
    }

    #[test]
    fn parse_bool_invalid() {
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("2"), None);
    }

    #[test]
    fn parse_u16_valid_and_range() {
        assert_eq!(parse_u16_range("8001", 1, 65535), Some(8001));
        assert_eq!(parse_u16_range("0", 1, 65535), None);
        assert_eq!(parse_u16_range("not_a_number", 1, 65535), None);
    }

    #[test]
    fn parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("30", 1, 600), Some(30));
        assert_eq!(parse_u64_range("0", 1, 600), None);
        assert_eq!(parse_u64_range("601", 1, 600), None);
        assert_eq!(parse_u64_range("abc", 1, 600), None);
    }

    #[test]
    fn parse_usize_range_bounds() {
        assert_eq!(parse_usize_range("100", 1, 100_000), Some(100));
        assert_eq!(parse_usize_range("0", 1, 100_000), None);
        assert_eq!(parse_usize_range("200000", 1, 100_000), None);
    }
}
