//! Routing gateway: resolves which node serves an object and drives the
//! read or write against it.
//!
//! # Read
//!
//! A cached location is trusted: the object is read from that node and a
//! not-found answer is returned as `None`. On a miss every discovered node is
//! tried in discovery order until one returns the object.
//!
//! # Write
//!
//! Writes are sticky. An object written once is always overwritten on the
//! same node. On a cache miss the writer takes the per-object placement lock,
//! probes every node for an existing copy and only places the object with the
//! [`Placement`] function when no node has it. The lock is held until the
//! cache records the outcome, so concurrent first writes of one ID land on a
//! single node.
//!
//! # Failures
//!
//! Any error other than not-found aborts the current scan and is returned
//! unchanged. A failure to reach a cached node does not evict the entry.

use std::future::Future;
use std::sync::Arc;

use shardgate_core::{
    ConfigError, ConnectorFactory, CredentialResolver, GatewayConfig, GatewayError,
    GatewayResult, NodeDirectory, NodeHandle, NodeId, ObjectId, ObjectReader,
};
use tracing::{debug, info, instrument};

use crate::cache::{CacheStats, InMemoryLocationCache, LocationCache};
use crate::locks::PlacementLocks;
use crate::placement::Placement;

/// Object routing gateway.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct Gateway {
    config: GatewayConfig,
    directory: Arc<dyn NodeDirectory>,
    credentials: Arc<dyn CredentialResolver>,
    connector: Arc<dyn ConnectorFactory>,
    placement: Placement,
    cache: Arc<dyn LocationCache>,
    locks: PlacementLocks,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.config)
            .field("placement", &self.placement)
            .field("cached_locations", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn builder(config: GatewayConfig) -> GatewayBuilder {
        GatewayBuilder::new(config)
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Location cache usage counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Read an object.
    ///
    /// Returns `Ok(None)` when no node holds the object.
    #[instrument(skip_all, fields(object_id = %object_id))]
    pub async fn read(&self, object_id: &ObjectId) -> GatewayResult<Option<ObjectReader>> {
        self.with_deadline(self.read_inner(object_id)).await
    }

    /// Write an object, overwriting it on the node that already owns it.
    #[instrument(skip_all, fields(object_id = %object_id, size_hint = ?size_hint))]
    pub async fn write(
        &self,
        object_id: &ObjectId,
        reader: ObjectReader,
        size_hint: Option<u64>,
    ) -> GatewayResult<()> {
        self.with_deadline(self.write_inner(object_id, reader, size_hint))
            .await
    }

    async fn read_inner(&self, object_id: &ObjectId) -> GatewayResult<Option<ObjectReader>> {
        if let Some(node_id) = self.cache.get(object_id) {
            let handle = self.connect(&node_id).await?;
            debug!(node_id = %node_id, "reading from cached node");
            return handle.read(&self.config.bucket, object_id.as_str()).await;
        }

        let nodes = self.discover().await?;
        for node_id in nodes {
            let handle = self.connect(&node_id).await?;
            debug!(node_id = %node_id, "reading");
            if let Some(reader) = handle.read(&self.config.bucket, object_id.as_str()).await? {
                self.cache.set(object_id, node_id);
                return Ok(Some(reader));
            }
        }

        debug!("object not found on any node");
        Ok(None)
    }

    async fn write_inner(
        &self,
        object_id: &ObjectId,
        reader: ObjectReader,
        size_hint: Option<u64>,
    ) -> GatewayResult<()> {
        if let Some(node_id) = self.cache.get(object_id) {
            return self.write_to(&node_id, object_id, reader, size_hint).await;
        }

        let _guard = self.locks.acquire(object_id).await;

        // Another writer may have placed the object while we waited.
        if let Some(node_id) = self.cache.get(object_id) {
            return self.write_to(&node_id, object_id, reader, size_hint).await;
        }

        let nodes = self.discover().await?;

        if let Some((node_id, handle)) = self.find_owner(object_id, &nodes).await? {
            self.cache.set(object_id, node_id.clone());
            debug!(node_id = %node_id, "overwriting on owner node");
            return handle
                .write(&self.config.bucket, object_id.as_str(), reader, size_hint)
                .await;
        }

        let node_id = self
            .placement
            .place(object_id, &nodes)
            .ok_or_else(|| GatewayError::NoInstancesAvailable {
                selector: self.config.selector.clone(),
            })?;
        info!(node_id = %node_id, "placing new object");
        self.write_to(&node_id, object_id, reader, size_hint).await?;
        self.cache.set(object_id, node_id);
        Ok(())
    }

    /// Probe nodes in order for an existing copy of the object.
    async fn find_owner(
        &self,
        object_id: &ObjectId,
        nodes: &[NodeId],
    ) -> GatewayResult<Option<(NodeId, Box<dyn NodeHandle>)>> {
        for node_id in nodes {
            let handle = self.connect(node_id).await?;
            if handle.exists(&self.config.bucket, object_id.as_str()).await? {
                return Ok(Some((node_id.clone(), handle)));
            }
        }
        Ok(None)
    }

    async fn write_to(
        &self,
        node_id: &NodeId,
        object_id: &ObjectId,
        reader: ObjectReader,
        size_hint: Option<u64>,
    ) -> GatewayResult<()> {
        let handle = self.connect(node_id).await?;
        debug!(node_id = %node_id, "writing");
        handle
            .write(&self.config.bucket, object_id.as_str(), reader, size_hint)
            .await
    }

    async fn discover(&self) -> GatewayResult<Vec<NodeId>> {
        let nodes = self.directory.find(&self.config.selector).await?;
        if nodes.is_empty() {
            return Err(GatewayError::NoInstancesAvailable {
                selector: self.config.selector.clone(),
            });
        }
        debug!(count = nodes.len(), "discovered storage nodes");
        Ok(nodes)
    }

    // Connections are rebuilt per operation; nothing is pooled.
    async fn connect(&self, node_id: &NodeId) -> GatewayResult<Box<dyn NodeHandle>> {
        let node = self.credentials.resolve(node_id).await?;
        self.connector.connect(&node).await
    }

    async fn with_deadline<T>(
        &self,
        operation: impl Future<Output = GatewayResult<T>>,
    ) -> GatewayResult<T> {
        match self.config.operation_timeout() {
            Some(after) => tokio::time::timeout(after, operation)
                .await
                .map_err(|_| GatewayError::Timeout { after })?,
            None => operation.await,
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Assembles a [`Gateway`] from its collaborators.
///
/// Directory, credential resolver and connector are required. The placement
/// defaults to the hash named in the config and the cache to an empty
/// [`InMemoryLocationCache`].
pub struct GatewayBuilder {
    config: GatewayConfig,
    directory: Option<Arc<dyn NodeDirectory>>,
    credentials: Option<Arc<dyn CredentialResolver>>,
    connector: Option<Arc<dyn ConnectorFactory>>,
    placement: Option<Placement>,
    cache: Option<Arc<dyn LocationCache>>,
}

impl GatewayBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            directory: None,
            credentials: None,
            connector: None,
            placement: None,
            cache: None,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn NodeDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialResolver>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_connector(mut self, connector: Arc<dyn ConnectorFactory>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn LocationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Gateway, ConfigError> {
        self.config.validate()?;

        let directory = self.directory.ok_or_else(|| missing("directory"))?;
        let credentials = self.credentials.ok_or_else(|| missing("credentials"))?;
        let connector = self.connector.ok_or_else(|| missing("connector"))?;
        let placement = self
            .placement
            .unwrap_or_else(|| Placement::from_kind(self.config.placement_hash));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryLocationCache::new()));

        Ok(Gateway {
            config: self.config,
            directory,
            credentials,
            connector,
            placement,
            cache,
            locks: PlacementLocks::new(),
        })
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::MissingRequired {
        field: field.to_string(),
    }
}
