//! Argument extraction and validation helpers shared by all actions.
//!
//! Every helper returns [`DispatchError::InvalidParams`] with a message that
//! names the offending parameter, so validation failures read the same across
//! the catalog.

use serde_json::{Map, Value};

use crate::errors::DispatchError;

fn missing(key: &str) -> DispatchError {
    DispatchError::InvalidParams {
        message: format!("Missing required parameter '{key}'"),
    }
}

fn wrong_type(key: &str, expected: &str) -> DispatchError {
    DispatchError::InvalidParams {
        message: format!("Parameter '{key}' must be {expected}"),
    }
}

/// Required string parameter.
pub fn require_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(missing(key)),
        Some(v) => v.as_str().ok_or_else(|| wrong_type(key, "a string")),
    }
}

/// Required numeric parameter (integer or float).
pub fn require_f64(args: &Map<String, Value>, key: &str) -> Result<f64, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(missing(key)),
        Some(v) => v.as_f64().ok_or_else(|| wrong_type(key, "a number")),
    }
}

/// Required integer parameter.
pub fn require_i64(args: &Map<String, Value>, key: &str) -> Result<i64, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(missing(key)),
        Some(v) => v.as_i64().ok_or_else(|| wrong_type(key, "an integer")),
    }
}

/// Required object parameter.
pub fn require_object<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(missing(key)),
        Some(v) => v.as_object().ok_or_else(|| wrong_type(key, "an object")),
    }
}

/// Optional string parameter. Absent and explicit-null both yield `None`.
pub fn optional_str<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "a string")),
    }
}

/// Optional integer parameter.
pub fn optional_i64(args: &Map<String, Value>, key: &str) -> Result<Option<i64>, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "an integer")),
    }
}

/// Optional boolean parameter.
pub fn optional_bool(args: &Map<String, Value>, key: &str) -> Result<Option<bool>, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "a boolean")),
    }
}

/// Optional object parameter.
pub fn optional_object<'a>(
    args: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, DispatchError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_object()
            .map(Some)
            .ok_or_else(|| wrong_type(key, "an object")),
    }
}
