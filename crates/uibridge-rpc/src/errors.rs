//! Dispatch error taxonomy.
//!
//! Internally the variants are distinct — logs and metrics label them by
//! [`DispatchError::kind`] — but on the wire every dispatch failure carries
//! the generic internal error code `-32603`, matching the behavior deployed
//! clients already depend on.

use crate::types::RpcErrorBody;

/// Generic internal error — the numeric code every dispatch failure maps to.
pub const INTERNAL_ERROR: i32 = -32603;

/// Errors surfaced to a dispatcher caller as a structured error object.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Method name not in the fixed protocol set.
    #[error("Unknown method: {method}")]
    UnknownMethod {
        /// The method name as received.
        method: String,
    },

    /// `tools/call` named an action the catalog does not contain.
    #[error("Unknown tool: {name}")]
    UnknownAction {
        /// The requested action name.
        name: String,
    },

    /// `resources/read` named an unrecognized resource URI.
    #[error("Unknown resource: {uri}")]
    UnknownResource {
        /// The requested URI.
        uri: String,
    },

    /// Missing or invalid parameters, including a handler's own validation
    /// rejection.
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },

    /// Unexpected internal failure.
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl DispatchError {
    /// Numeric code sent on the wire. Always [`INTERNAL_ERROR`].
    pub fn code(&self) -> i32 {
        INTERNAL_ERROR
    }

    /// Stable label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownMethod { .. } => "unknown_method",
            Self::UnknownAction { .. } => "unknown_action",
            Self::UnknownResource { .. } => "unknown_resource",
            Self::InvalidParams { .. } => "invalid_params",
            Self::Internal { .. } => "internal",
        }
    }

    /// Convert to the wire-format error body.
    pub fn to_error_body(&self) -> RpcErrorBody {
        RpcErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_message() {
        let err = DispatchError::UnknownMethod {
            method: "tools/delete".into(),
        };
        assert_eq!(err.to_string(), "Unknown method: tools/delete");
        assert_eq!(err.kind(), "unknown_method");
    }

    #[test]
    fn unknown_action_message() {
        let err = DispatchError::UnknownAction {
            name: "explode".into(),
        };
        assert_eq!(err.to_string(), "Unknown tool: explode");
    }

    #[test]
    fn every_variant_maps_to_internal_error_code() {
        let errors = [
            DispatchError::UnknownMethod { method: "x".into() },
            DispatchError::UnknownAction { name: "x".into() },
            DispatchError::UnknownResource { uri: "x".into() },
            DispatchError::InvalidParams {
                message: "bad".into(),
            },
            DispatchError::Internal {
                message: "boom".into(),
            },
        ];
        for err in errors {
            assert_eq!(err.code(), INTERNAL_ERROR);
        }
    }

    #[test]
    fn error_body_carries_message() {
        let err = DispatchError::InvalidParams {
            message: "Direction must be 'left' or 'right'".into(),
        };
        let body = err.to_error_body();
        assert_eq!(body.code, -32603);
        assert_eq!(body.message, "Direction must be 'left' or 'right'");
    }
}
