//! Client error types.

use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;
use crate::objects::BatchOutcome;
use crate::transport::TransportError;

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The service could not be reached or the exchange did not complete.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered with a status the operation does not handle.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Http {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// A model-level rule was violated outside an operation that maps it.
    #[error("model error: {0}")]
    Model(#[from] quiver_core::Error),

    /// A collection with the same name already exists.
    #[error("collection {name} already exists: {message}")]
    DuplicateCollection { name: String, message: String },

    /// The named entity does not exist on the service.
    #[error("{entity} not found: {name}")]
    NotFound { entity: &'static str, name: String },

    /// Input was rejected, locally or by the service.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A query could not be built or the service reported query errors.
    #[error("query error: {message}")]
    Query { message: String },

    /// Some records in a batch were not created.
    #[error("{failed} of {total} records in batch failed")]
    PartialBatchFailure {
        total: usize,
        failed: usize,
        outcomes: Vec<BatchOutcome>,
    },

    /// A service response could not be decoded.
    #[error("unexpected response to {operation}: {message}")]
    Parse {
        operation: &'static str,
        message: String,
    },
}

impl ClientError {
    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn validation(error: impl std::fmt::Display) -> Self {
        Self::Validation {
            message: error.to_string(),
        }
    }

    pub(crate) fn query(error: impl std::fmt::Display) -> Self {
        Self::Query {
            message: error.to_string(),
        }
    }

    pub(crate) fn parse(operation: &'static str, error: impl std::fmt::Display) -> Self {
        Self::Parse {
            operation,
            message: error.to_string(),
        }
    }

    pub(crate) fn http(operation: &'static str, status: u16, body: &Value) -> Self {
        Self::Http {
            operation,
            status,
            message: service_message(body),
        }
    }

    /// Map a non-2xx answer from the query endpoint. A rejected document
    /// (400 or 422) is a query error; anything else stays an HTTP error so
    /// server failures remain transient.
    pub(crate) fn query_http(operation: &'static str, status: u16, body: &Value) -> Self {
        match status {
            400 | 422 => Self::Query {
                message: service_message(body),
            },
            _ => Self::http(operation, status, body),
        }
    }
}

/// Extract the human-readable message from a service error body.
///
/// The service reports errors as `{"error": [{"message": ...}]}`; anything
/// else is rendered as-is.
pub(crate) fn service_message(body: &Value) -> String {
    let messages: Vec<&str> = body
        .get("error")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    if !messages.is_empty() {
        return messages.join("; ");
    }
    match body {
        Value::Null => "(empty body)".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convenience alias for client results.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_message_extraction() {
        let body = json!({"error": [{"message": "class name Movie already exists"}]});
        assert_eq!(service_message(&body), "class name Movie already exists");
        assert_eq!(service_message(&json!("plain")), "plain");
        assert_eq!(service_message(&Value::Null), "(empty body)");
        assert_eq!(service_message(&json!({"x": 1})), r#"{"x":1}"#);
    }

    #[test]
    fn test_is_transient() {
        assert!(ClientError::http("get", 503, &Value::Null).is_transient());
        assert!(ClientError::http("get", 429, &Value::Null).is_transient());
        assert!(!ClientError::http("get", 400, &Value::Null).is_transient());
        assert!(!ClientError::validation("bad").is_transient());
    }

    #[test]
    fn test_query_http_separates_rejections_from_failures() {
        let body = json!({"error": [{"message": "Syntax Error GraphQL request"}]});
        assert!(matches!(
            ClientError::query_http("get", 422, &body),
            ClientError::Query { message } if message == "Syntax Error GraphQL request"
        ));
        assert!(matches!(
            ClientError::query_http("get", 400, &body),
            ClientError::Query { .. }
        ));
        assert!(ClientError::query_http("get", 502, &body).is_transient());
    }

    #[test]
    fn test_is_not_found() {
        let err = ClientError::NotFound {
            entity: "collection",
            name: "Movie".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
    }
}
