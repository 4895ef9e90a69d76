//! Error types for Meridian.
//!
//! Failures inside a dispatch are expressed as one tagged type,
//! [`DispatchError`], and resolved by a single `match` at the dispatcher
//! boundary:
//!
//! | Variant | Source | Resolved by |
//! |---|---|---|
//! | `Validation` | a schema rejected a request field | `invalidRequest` modifier (400) |
//! | `Handler` | a middleware step or handler failed | `error` modifier (declared status or 500) |
//! | `RoutingMiss` | no route matched method and path | `notFound` modifier (404) |
//! | `MalformedTransport` | request line could not be interpreted | `error` modifier (400) |

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::schema::{FieldTarget, Issue};

/// Result returned by handlers and middleware steps.
///
/// `Ok(Some(value))` asks for a success envelope around `value`;
/// `Ok(None)` means the step produced nothing (or wrote the response itself).
pub type HandlerResult = Result<Option<Value>, HandlerError>;

/// Failure raised by a handler or middleware step.
///
/// # Example
///
/// ```
/// use meridian_core::HandlerError;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let err = HandlerError::not_found("user 7 does not exist")
///     .with_data(json!({ "id": 7 }));
/// assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
/// assert_eq!(err.public_message(), "user 7 does not exist");
///
/// let err = HandlerError::internal("database offline");
/// assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(err.public_message(), "Internal server error");
/// ```
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Structured application error with a declared status.
    #[error("{status}: {message}")]
    Status {
        /// Status to respond with.
        status: StatusCode,
        /// Message shown to the client.
        message: String,
        /// Optional payload shown to the client.
        data: Option<Value>,
    },

    /// Unstructured failure; responds 500 with a generic message.
    #[error("Internal error: {message}")]
    Internal {
        /// Description for logs (not exposed to clients).
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },
}

/// Message sent to clients for unstructured failures.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

impl HandlerError {
    /// Creates a structured error with an explicit status.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a 400 error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::status(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::status(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::status(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::status(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::status(StatusCode::CONFLICT, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an internal error wrapping a source error.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Attaches client-visible data to a structured error.
    ///
    /// Internal errors never expose data, so this is a no-op for them.
    #[must_use]
    pub fn with_data(mut self, value: Value) -> Self {
        if let Self::Status { data, .. } = &mut self {
            *data = Some(value);
        }
        self
    }

    /// Returns the HTTP status to respond with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Status { status, .. } => *status,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message that may be shown to clients.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Status { message, .. } => message,
            Self::Internal { .. } => INTERNAL_ERROR_MESSAGE,
        }
    }

    /// Returns client-visible data, if any.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Status { data, .. } => data.as_ref(),
            Self::Internal { .. } => None,
        }
    }

    /// Returns true for unstructured failures.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal_with_source("JSON serialization failed", err)
    }
}

/// A request field was rejected by its validator.
#[derive(Debug, Clone, Error)]
#[error("invalid {target} for route '{route}' ({} issue(s))", .issues.len())]
pub struct ValidationError {
    /// The rejected field.
    pub target: FieldTarget,
    /// Name (or `METHOD path`) of the route being validated.
    pub route: String,
    /// Problems reported by the validator.
    pub issues: Vec<Issue>,
}

/// Every way a dispatch can end other than a normal response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A handler or middleware step failed.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// No route matched.
    #[error("no route for {method} {path}")]
    RoutingMiss {
        /// Request method
        method: String,
        /// Request path
        path: String,
    },

    /// The request line could not be interpreted.
    #[error("malformed request: {reason}")]
    MalformedTransport {
        /// What was wrong
        reason: String,
    },
}

impl DispatchError {
    /// Creates a routing miss.
    pub fn routing_miss(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self::RoutingMiss {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Creates a malformed-transport error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedTransport {
            reason: reason.into(),
        }
    }

    /// Returns the kind as a short label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Handler(_) => "handler",
            Self::RoutingMiss { .. } => "routing_miss",
            Self::MalformedTransport { .. } => "malformed_transport",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::error::Error as _;

    #[test]
    fn test_status_errors() {
        let err = HandlerError::conflict("version mismatch").with_data(json!({ "v": 2 }));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "version mismatch");
        assert_eq!(err.data(), Some(&json!({ "v": 2 })));
        assert!(!err.is_internal());
        assert_eq!(err.to_string(), "409 Conflict: version mismatch");
    }

    #[test]
    fn test_internal_hides_details() {
        let err = HandlerError::internal("connection refused").with_data(json!(1));
        assert!(err.is_internal());
        assert_eq!(err.public_message(), INTERNAL_ERROR_MESSAGE);
        assert!(err.data().is_none());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_from_anyhow_keeps_source() {
        let err: HandlerError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_from_serde_json() {
        let parse = serde_json::from_str::<u8>("x").unwrap_err();
        let err = HandlerError::from(parse);
        assert!(err.is_internal());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError {
            target: FieldTarget::Params,
            route: "getUser".to_string(),
            issues: vec![Issue::new("expected number")],
        };
        assert_eq!(err.to_string(), "invalid params for route 'getUser' (1 issue(s))");
    }

    #[test]
    fn test_dispatch_error_kinds() {
        assert_eq!(DispatchError::routing_miss("GET", "/x").kind(), "routing_miss");
        assert_eq!(DispatchError::malformed("no path").kind(), "malformed_transport");
        let handler: DispatchError = HandlerError::internal("x").into();
        assert_eq!(handler.kind(), "handler");
    }
}
