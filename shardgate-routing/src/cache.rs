//! Location cache: object ID → node last confirmed to hold it.
//!
//! An entry is authoritative until overwritten. There is no TTL, no eviction
//! and no delete; a node that no longer answers for a cached object surfaces
//! as an error to the caller rather than as a cache invalidation.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use shardgate_core::{NodeId, ObjectId};

/// Pluggable store of object locations.
///
/// Implementations must be safe to share across request tasks.
pub trait LocationCache: Send + Sync {
    /// Cached node for `object_id`, if any.
    fn get(&self, object_id: &ObjectId) -> Option<NodeId>;

    /// Record `node_id` as the location of `object_id`, replacing any entry.
    fn set(&self, object_id: &ObjectId, node_id: NodeId);

    /// Number of cached entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usage counters.
    fn stats(&self) -> CacheStats;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Sharded in-memory location cache.
#[derive(Debug, Default)]
pub struct InMemoryLocationCache {
    entries: DashMap<ObjectId, NodeId>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryLocationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocationCache for InMemoryLocationCache {
    fn get(&self, object_id: &ObjectId) -> Option<NodeId> {
        let found = self.entries.get(object_id).map(|entry| entry.value().clone());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    fn set(&self, object_id: &ObjectId, node_id: NodeId) {
        self.entries.insert(object_id.clone(), node_id);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
        }
    }
}
