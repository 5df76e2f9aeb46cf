//! Port traits to the outside world.
//!
//! The routing engine only talks to discovery and storage through these
//! traits. Adapters (file directory, HTTP connector) and test mocks implement
//! them.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::{GatewayResult, Node, NodeId};

/// Byte stream of an object's content.
pub type ObjectReader = Box<dyn AsyncRead + Send + Unpin>;

/// Enumerates storage nodes currently reachable.
#[async_trait]
pub trait NodeDirectory: Send + Sync {
    /// Return the IDs of nodes matching `selector`, in discovery order.
    ///
    /// An empty list is a valid answer; the gateway decides what it means.
    async fn find(&self, selector: &str) -> GatewayResult<Vec<NodeId>>;
}

/// Resolves a node ID to the address and credentials needed to reach it.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, node_id: &NodeId) -> GatewayResult<Node>;
}

/// Builds a handle to one storage node.
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    async fn connect(&self, node: &Node) -> GatewayResult<Box<dyn NodeHandle>>;
}

/// Object operations against a single storage node.
///
/// Absence of an object is a normal answer (`None` / `false`), never an error.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    /// Open the object for reading, or `None` if the node does not hold it.
    async fn read(&self, bucket: &str, object_id: &str) -> GatewayResult<Option<ObjectReader>>;

    /// Store the object, replacing any previous content.
    ///
    /// `size_hint` is the exact length when the caller knows it.
    async fn write(
        &self,
        bucket: &str,
        object_id: &str,
        reader: ObjectReader,
        size_hint: Option<u64>,
    ) -> GatewayResult<()>;

    /// Probe whether the node holds the object.
    async fn exists(&self, bucket: &str, object_id: &str) -> GatewayResult<bool>;
}
