//! Error types for SHARDGATE operations

use crate::NodeId;
use std::time::Duration;
use thiserror::Error;

/// Node discovery errors.
///
/// Raised when the directory or the credential lookup fails. Fatal for the
/// current call; the gateway never retries them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Node lookup failed for selector {selector}: {reason}")]
    FindFailed { selector: String, reason: String },

    #[error("Connection details unavailable for node {node_id}: {reason}")]
    CredentialsUnavailable { node_id: NodeId, reason: String },
}

/// Errors talking to a specific storage node.
///
/// Any of these aborts an in-progress scan.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Cannot connect to node {node_id}: {reason}")]
    ConnectFailed { node_id: NodeId, reason: String },

    #[error("Request to node {node_id} failed: {reason}")]
    Transport { node_id: NodeId, reason: String },
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all SHARDGATE errors.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("No storage instances available for selector {selector}, check if cluster is running")]
    NoInstancesAvailable { selector: String },

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Operation timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for SHARDGATE operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

// =============================================================================
// TESTS
// =============================================================================
