//! SHARDGATE Core - Shared Types and Ports
//!
//! Identifiers, node connection details, the error taxonomy, gateway
//! configuration and the port traits every other crate builds on.
//! This crate contains no routing logic.

pub mod config;
pub mod error;
pub mod identity;
pub mod node;
pub mod ports;

pub use config::{GatewayConfig, PlacementHash, DEFAULT_BUCKET, DEFAULT_SELECTOR};
pub use error::{
    ConfigError, ConnectionError, DiscoveryError, GatewayError, GatewayResult, ValidationError,
};
pub use identity::{NodeId, ObjectId};
pub use node::{Credentials, Node};
pub use ports::{ConnectorFactory, CredentialResolver, NodeDirectory, NodeHandle, ObjectReader};
