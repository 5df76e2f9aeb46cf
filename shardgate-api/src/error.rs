//! Error Types for the SHARDGATE HTTP API
//!
//! `ApiError` carries an [`ErrorCode`] and a message and renders as a JSON
//! body with the matching HTTP status. Gateway errors are mapped here so
//! handlers can use `?` directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shardgate_core::{ConfigError, GatewayError};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Path does not name a known route
    RouteNotFound,

    /// HTTP method not supported on the route
    MethodNotAllowed,

    /// Object ID fails pattern or length checks
    InvalidObjectId,

    /// No storage node holds the object
    ObjectNotFound,

    /// Storage nodes cannot be discovered or none are running
    ServiceUnavailable,

    /// A storage node failed or could not be reached
    StorageNodeError,

    /// Operation timed out
    Timeout,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::RouteNotFound => StatusCode::BAD_REQUEST,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::InvalidObjectId => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::ObjectNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::StorageNodeError => StatusCode::BAD_GATEWAY,
            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::RouteNotFound => "route cannot be handled",
            ErrorCode::MethodNotAllowed => "method not allowed",
            ErrorCode::InvalidObjectId => "id is not valid",
            ErrorCode::ObjectNotFound => "object not found",
            ErrorCode::ServiceUnavailable => "storage cluster unavailable",
            ErrorCode::StorageNodeError => "storage node error",
            ErrorCode::Timeout => "operation timed out",
            ErrorCode::InternalError => "server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: String,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    pub fn route_not_found() -> Self {
        Self::from_code(ErrorCode::RouteNotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::from_code(ErrorCode::MethodNotAllowed)
    }

    pub fn invalid_object_id() -> Self {
        Self::from_code(ErrorCode::InvalidObjectId)
    }

    pub fn object_not_found() -> Self {
        Self::from_code(ErrorCode::ObjectNotFound)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, status = status.as_u16(), "{}", self.message);
        }
        (status, Json(self)).into_response()
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// CONVERSIONS
// ============================================================================

/// Gateway errors are logged in full; clients get the category only.
impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        tracing::warn!(error = %err, "gateway operation failed");
        match err {
            GatewayError::Discovery(_) | GatewayError::NoInstancesAvailable { .. } => {
                ApiError::from_code(ErrorCode::ServiceUnavailable)
            }
            GatewayError::Connection(_) => ApiError::from_code(ErrorCode::StorageNodeError),
            GatewayError::Timeout { .. } => ApiError::from_code(ErrorCode::Timeout),
            GatewayError::Validation(e) => ApiError::new(ErrorCode::InvalidObjectId, e.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::internal_error(format!("Configuration error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardgate_core::{ConnectionError, DiscoveryError, NodeId};
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::ObjectNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::InvalidObjectId.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ErrorCode::RouteNotFound.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_gateway_errors_map_to_5xx() {
        let discovery: ApiError = GatewayError::from(DiscoveryError::FindFailed {
            selector: "s".to_string(),
            reason: "down".to_string(),
        })
        .into();
        assert_eq!(discovery.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let empty: ApiError = GatewayError::NoInstancesAvailable {
            selector: "s".to_string(),
        }
        .into();
        assert_eq!(empty.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let connection: ApiError = GatewayError::from(ConnectionError::Transport {
            node_id: NodeId::from("n"),
            reason: "reset".to_string(),
        })
        .into();
        assert_eq!(connection.status_code(), StatusCode::BAD_GATEWAY);
        assert!(!connection.message.contains("reset"));

        let timeout: ApiError = GatewayError::Timeout {
            after: Duration::from_secs(1),
        }
        .into();
        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_config_error_is_500() {
        let err: ApiError = ConfigError::MissingRequired {
            field: "directory".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("directory"));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(ApiError::object_not_found()).unwrap();
        assert_eq!(json["code"], "OBJECT_NOT_FOUND");
        assert_eq!(json["error"], "object not found");
    }
}
