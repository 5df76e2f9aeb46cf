//! Node directory backed by a TOML file.
//!
//! ```toml
//! [[nodes]]
//! id = "amazin-object-storage-node-1"
//! address = "10.0.0.11:9000"
//! access_key_id = "ring"
//! secret_access_key = "treepotato"
//! ```
//!
//! The file is re-read on every lookup so nodes can be added or removed
//! while the gateway runs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use shardgate_core::{
    CredentialResolver, Credentials, DiscoveryError, GatewayResult, Node, NodeDirectory, NodeId,
};

#[derive(Debug, Default, Deserialize)]
struct NodesFile {
    #[serde(default)]
    nodes: Vec<NodeEntry>,
}

#[derive(Debug, Deserialize)]
struct NodeEntry {
    id: String,
    address: String,
    access_key_id: String,
    secret_access_key: String,
}

impl NodeEntry {
    fn into_node(self) -> Node {
        Node::new(
            self.id,
            self.address,
            Credentials::new(self.access_key_id, self.secret_access_key),
        )
    }
}

/// Discovers nodes and their credentials from a TOML file on disk.
#[derive(Debug, Clone)]
pub struct FileNodeDirectory {
    path: PathBuf,
}

impl FileNodeDirectory {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<NodesFile, String> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| format!("cannot read {}: {}", self.path.display(), e))?;
        toml::from_str(&raw).map_err(|e| format!("cannot parse {}: {}", self.path.display(), e))
    }
}

#[async_trait]
impl NodeDirectory for FileNodeDirectory {
    /// Nodes whose ID contains `selector`, in file order.
    async fn find(&self, selector: &str) -> GatewayResult<Vec<NodeId>> {
        let file = self
            .load()
            .await
            .map_err(|reason| DiscoveryError::FindFailed {
                selector: selector.to_string(),
                reason,
            })?;

        let ids: Vec<NodeId> = file
            .nodes
            .into_iter()
            .filter(|entry| entry.id.contains(selector))
            .map(|entry| NodeId::new(entry.id))
            .collect();

        tracing::debug!(selector, count = ids.len(), "nodes discovered");
        Ok(ids)
    }
}

#[async_trait]
impl CredentialResolver for FileNodeDirectory {
    async fn resolve(&self, node_id: &NodeId) -> GatewayResult<Node> {
        let file = self
            .load()
            .await
            .map_err(|reason| DiscoveryError::CredentialsUnavailable {
                node_id: node_id.clone(),
                reason,
            })?;

        file.nodes
            .into_iter()
            .find(|entry| entry.id == node_id.as_str())
            .map(NodeEntry::into_node)
            .ok_or_else(|| {
                DiscoveryError::CredentialsUnavailable {
                    node_id: node_id.clone(),
                    reason: "no connection details found for the node".to_string(),
                }
                .into()
            })
    }
}
