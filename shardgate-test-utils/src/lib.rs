//! SHARDGATE Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - An in-memory storage cluster implementing every port
//! - Proptest generators for identifiers
//! - Fixtures and assertions for gateway results

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

pub use shardgate_core::{
    ConnectionError, ConnectorFactory, Credentials, CredentialResolver, DiscoveryError,
    GatewayConfig, GatewayError, GatewayResult, Node, NodeDirectory, NodeHandle, NodeId,
    ObjectId, ObjectReader, PlacementHash,
};

// ============================================================================
// MOCK CLUSTER
// ============================================================================

/// Failures a mock node can be told to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFaults {
    pub fail_connect: bool,
    pub fail_read: bool,
    pub fail_write: bool,
    pub fail_exists: bool,
}

impl NodeFaults {
    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Default::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_read: true,
            ..Default::default()
        }
    }

    pub fn failing_probes() -> Self {
        Self {
            fail_exists: true,
            ..Default::default()
        }
    }
}

/// Per-node call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeCalls {
    pub connects: usize,
    pub reads: usize,
    pub writes: usize,
    pub exists: usize,
}

#[derive(Debug, Default)]
struct MockNode {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    faults: RwLock<NodeFaults>,
    connects: AtomicUsize,
    reads: AtomicUsize,
    writes: AtomicUsize,
    exists: AtomicUsize,
}

impl MockNode {
    fn calls(&self) -> NodeCalls {
        NodeCalls {
            connects: self.connects.load(Ordering::SeqCst),
            reads: self.reads.load(Ordering::SeqCst),
            writes: self.writes.load(Ordering::SeqCst),
            exists: self.exists.load(Ordering::SeqCst),
        }
    }

    fn faults(&self) -> NodeFaults {
        *self.faults.read().unwrap()
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    order: RwLock<Vec<NodeId>>,
    nodes: RwLock<HashMap<NodeId, Arc<MockNode>>>,
    scripted_discovery: Mutex<VecDeque<Vec<NodeId>>>,
    find_calls: AtomicUsize,
    fail_find: RwLock<bool>,
    latency: RwLock<Option<Duration>>,
}

/// In-memory storage cluster.
///
/// Implements [`NodeDirectory`], [`CredentialResolver`] and
/// [`ConnectorFactory`] at once. Clones share state, so one clone can be
/// handed to a gateway while the test inspects another.
#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    state: Arc<ClusterState>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cluster with the given nodes, discovered in this order.
    pub fn with_nodes(ids: &[&str]) -> Self {
        let cluster = Self::new();
        for id in ids {
            cluster.add_node(id);
        }
        cluster
    }

    /// Register a node at the end of the discovery order.
    pub fn add_node(&self, id: &str) {
        let node_id = NodeId::from(id);
        self.state
            .nodes
            .write()
            .unwrap()
            .entry(node_id.clone())
            .or_default();
        let mut order = self.state.order.write().unwrap();
        if !order.contains(&node_id) {
            order.push(node_id);
        }
    }

    /// Hide a node from discovery. Its data and credentials stay available.
    pub fn hide_node(&self, id: &str) {
        self.state
            .order
            .write()
            .unwrap()
            .retain(|n| n.as_str() != id);
    }

    /// Replace the discovery order.
    pub fn set_discovery_order(&self, ids: &[&str]) {
        *self.state.order.write().unwrap() = ids.iter().map(|id| NodeId::from(*id)).collect();
    }

    /// Queue node lists to be returned by successive `find` calls before
    /// falling back to the registered order.
    pub fn script_discovery(&self, answers: Vec<Vec<&str>>) {
        let mut scripted = self.state.scripted_discovery.lock().unwrap();
        for answer in answers {
            scripted.push_back(answer.into_iter().map(NodeId::from).collect());
        }
    }

    pub fn fail_discovery(&self, fail: bool) {
        *self.state.fail_find.write().unwrap() = fail;
    }

    /// Delay every node operation by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.write().unwrap() = Some(latency);
    }

    pub fn set_faults(&self, id: &str, faults: NodeFaults) {
        *self.node(id).faults.write().unwrap() = faults;
    }

    /// Store an object directly on a node, bypassing the gateway.
    pub fn put_object(&self, id: &str, bucket: &str, object: &str, data: &[u8]) {
        self.node(id)
            .objects
            .write()
            .unwrap()
            .insert((bucket.to_string(), object.to_string()), data.to_vec());
    }

    /// Delete an object from a node behind the gateway's back.
    pub fn remove_object(&self, id: &str, bucket: &str, object: &str) {
        self.node(id)
            .objects
            .write()
            .unwrap()
            .remove(&(bucket.to_string(), object.to_string()));
    }

    /// Content of an object on a node.
    pub fn object(&self, id: &str, bucket: &str, object: &str) -> Option<Vec<u8>> {
        self.node(id)
            .objects
            .read()
            .unwrap()
            .get(&(bucket.to_string(), object.to_string()))
            .cloned()
    }

    /// Nodes holding a copy of the object, sorted by ID.
    pub fn holders(&self, bucket: &str, object: &str) -> Vec<NodeId> {
        let key = (bucket.to_string(), object.to_string());
        let mut holders: Vec<NodeId> = self
            .state
            .nodes
            .read()
            .unwrap()
            .iter()
            .filter(|(_, node)| node.objects.read().unwrap().contains_key(&key))
            .map(|(id, _)| id.clone())
            .collect();
        holders.sort();
        holders
    }

    pub fn calls(&self, id: &str) -> NodeCalls {
        self.node(id).calls()
    }

    /// Number of directory lookups served so far.
    pub fn find_calls(&self) -> usize {
        self.state.find_calls.load(Ordering::SeqCst)
    }

    fn node(&self, id: &str) -> Arc<MockNode> {
        self.state
            .nodes
            .read()
            .unwrap()
            .get(&NodeId::from(id))
            .cloned()
            .unwrap_or_else(|| panic!("unknown mock node {}", id))
    }

    fn latency(&self) -> Option<Duration> {
        *self.state.latency.read().unwrap()
    }
}

#[async_trait]
impl NodeDirectory for MockCluster {
    async fn find(&self, selector: &str) -> GatewayResult<Vec<NodeId>> {
        self.state.find_calls.fetch_add(1, Ordering::SeqCst);
        if *self.state.fail_find.read().unwrap() {
            return Err(DiscoveryError::FindFailed {
                selector: selector.to_string(),
                reason: "directory unavailable".to_string(),
            }
            .into());
        }
        if let Some(answer) = self.state.scripted_discovery.lock().unwrap().pop_front() {
            return Ok(answer);
        }
        Ok(self.state.order.read().unwrap().clone())
    }
}

#[async_trait]
impl CredentialResolver for MockCluster {
    async fn resolve(&self, node_id: &NodeId) -> GatewayResult<Node> {
        if !self.state.nodes.read().unwrap().contains_key(node_id) {
            return Err(DiscoveryError::CredentialsUnavailable {
                node_id: node_id.clone(),
                reason: "no connection details found".to_string(),
            }
            .into());
        }
        Ok(Node::new(
            node_id.clone(),
            format!("mock://{}", node_id),
            Credentials::new("mock-access", "mock-secret"),
        ))
    }
}

#[async_trait]
impl ConnectorFactory for MockCluster {
    async fn connect(&self, node: &Node) -> GatewayResult<Box<dyn NodeHandle>> {
        let mock = self
            .state
            .nodes
            .read()
            .unwrap()
            .get(&node.id)
            .cloned()
            .ok_or_else(|| ConnectionError::ConnectFailed {
                node_id: node.id.clone(),
                reason: "unknown node".to_string(),
            })?;
        mock.connects.fetch_add(1, Ordering::SeqCst);
        if mock.faults().fail_connect {
            return Err(ConnectionError::ConnectFailed {
                node_id: node.id.clone(),
                reason: "the storage node is offline".to_string(),
            }
            .into());
        }
        Ok(Box::new(MockHandle {
            node_id: node.id.clone(),
            node: mock,
            latency: self.latency(),
        }))
    }
}

struct MockHandle {
    node_id: NodeId,
    node: Arc<MockNode>,
    latency: Option<Duration>,
}

impl MockHandle {
    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn transport_error(&self, op: &str) -> GatewayError {
        ConnectionError::Transport {
            node_id: self.node_id.clone(),
            reason: format!("injected {} failure", op),
        }
        .into()
    }
}

#[async_trait]
impl NodeHandle for MockHandle {
    async fn read(&self, bucket: &str, object_id: &str) -> GatewayResult<Option<ObjectReader>> {
        self.node.reads.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.node.faults().fail_read {
            return Err(self.transport_error("read"));
        }
        let data = self
            .node
            .objects
            .read()
            .unwrap()
            .get(&(bucket.to_string(), object_id.to_string()))
            .cloned();
        Ok(data.map(|bytes| Box::new(Cursor::new(bytes)) as ObjectReader))
    }

    async fn write(
        &self,
        bucket: &str,
        object_id: &str,
        mut reader: ObjectReader,
        _size_hint: Option<u64>,
    ) -> GatewayResult<()> {
        self.node.writes.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.node.faults().fail_write {
            return Err(self.transport_error("write"));
        }
        let mut data = Vec::new();
        reader
            .read_to_end(&mut data)
            .await
            .map_err(|e| ConnectionError::Transport {
                node_id: self.node_id.clone(),
                reason: e.to_string(),
            })?;
        self.node
            .objects
            .write()
            .unwrap()
            .insert((bucket.to_string(), object_id.to_string()), data);
        Ok(())
    }

    async fn exists(&self, bucket: &str, object_id: &str) -> GatewayResult<bool> {
        self.node.exists.fetch_add(1, Ordering::SeqCst);
        self.delay().await;
        if self.node.faults().fail_exists {
            return Err(self.transport_error("exists"));
        }
        Ok(self
            .node
            .objects
            .read()
            .unwrap()
            .contains_key(&(bucket.to_string(), object_id.to_string())))
    }
}

// ============================================================================
// STREAM HELPERS
// ============================================================================

/// Wrap bytes as an object stream.
pub fn reader_from(data: impl Into<Vec<u8>>) -> ObjectReader {
    Box::new(Cursor::new(data.into()))
}

/// Drain an object stream.
pub async fn read_all(mut reader: ObjectReader) -> Vec<u8> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .await
        .expect("mock streams never fail");
    data
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for identifiers.

    use super::*;
    use proptest::prelude::*;

    /// Object IDs accepted by the HTTP adapter.
    pub fn arb_object_id() -> impl Strategy<Value = ObjectId> {
        "[a-zA-Z0-9]{1,32}".prop_map(|s| ObjectId::new(s).expect("non-empty by construction"))
    }

    /// A single node ID.
    pub fn arb_node_id() -> impl Strategy<Value = NodeId> {
        "node-[a-z0-9]{1,6}".prop_map(NodeId::from)
    }

    /// A non-empty set of distinct node IDs, in arbitrary order.
    pub fn arb_node_set(max: usize) -> impl Strategy<Value = Vec<NodeId>> {
        prop::collection::btree_set("node-[a-z0-9]{1,6}", 1..=max.max(1))
            .prop_map(|ids| ids.into_iter().map(NodeId::from).collect::<Vec<_>>())
            .prop_shuffle()
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built configurations for common scenarios.

    use super::*;

    /// Bucket used by the fixtures.
    pub const TEST_BUCKET: &str = "store";

    /// Default config with the legacy hash, so placements are predictable
    /// from the code-point sum.
    pub fn legacy_config() -> GatewayConfig {
        GatewayConfig::default()
            .with_bucket(TEST_BUCKET)
            .with_placement_hash(PlacementHash::LegacySum)
    }

    pub fn default_config() -> GatewayConfig {
        GatewayConfig::default().with_bucket(TEST_BUCKET)
    }

    pub fn object_id(id: &str) -> ObjectId {
        ObjectId::new(id).expect("fixture object IDs are non-empty")
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for gateway results.

    use super::*;

    /// Assert that a GatewayResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &GatewayResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a GatewayResult is a connection error.
    #[track_caller]
    pub fn assert_connection_error<T: std::fmt::Debug>(result: &GatewayResult<T>) {
        match result {
            Err(GatewayError::Connection(_)) => {}
            other => panic!("Expected Connection error, got: {:?}", other),
        }
    }

    /// Assert that a GatewayResult is a discovery error.
    #[track_caller]
    pub fn assert_discovery_error<T: std::fmt::Debug>(result: &GatewayResult<T>) {
        match result {
            Err(GatewayError::Discovery(_)) => {}
            other => panic!("Expected Discovery error, got: {:?}", other),
        }
    }

    /// Assert that a GatewayResult reports an empty cluster.
    #[track_caller]
    pub fn assert_no_instances<T: std::fmt::Debug>(result: &GatewayResult<T>) {
        match result {
            Err(GatewayError::NoInstancesAvailable { .. }) => {}
            other => panic!("Expected NoInstancesAvailable, got: {:?}", other),
        }
    }
}
