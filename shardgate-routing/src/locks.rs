//! Per-object exclusive locks for the resolve-or-create placement step.
//!
//! Writers for the same unplaced object ID queue on one mutex; writers for
//! different IDs never contend beyond a shard lock in the map. An entry is
//! dropped from the map once no holder or waiter references it, including
//! waiters whose future was dropped before the lock was granted.

use std::sync::Arc;

use dashmap::DashMap;
use shardgate_core::ObjectId;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<ObjectId, Arc<Mutex<()>>>;

/// Keyed lock table shared by a gateway instance.
#[derive(Debug, Default, Clone)]
pub struct PlacementLocks {
    table: Arc<LockTable>,
}

impl PlacementLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `object_id`.
    ///
    /// Dropping the returned future before it resolves gives up the wait.
    pub async fn acquire(&self, object_id: &ObjectId) -> PlacementGuard {
        let slot = self.slot(object_id);
        // Declared after `slot` so a cancelled wait releases its reference
        // to the mutex before the slot checks whether it was the last one.
        let wait = Arc::clone(&slot.mutex).lock_owned();
        tokio::pin!(wait);
        let guard = (&mut wait).await;
        PlacementGuard {
            _guard: guard,
            _slot: slot,
        }
    }

    fn slot(&self, object_id: &ObjectId) -> LockSlot {
        let mutex = self
            .table
            .entry(object_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        LockSlot {
            table: Arc::clone(&self.table),
            object_id: object_id.clone(),
            mutex,
        }
    }

    /// Number of object IDs with a live lock entry.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// One holder's or waiter's reference to a table entry.
///
/// The last slot to go removes the entry.
#[derive(Debug)]
struct LockSlot {
    table: Arc<LockTable>,
    object_id: ObjectId,
    mutex: Arc<Mutex<()>>,
}

impl Drop for LockSlot {
    fn drop(&mut self) {
        // The table's reference plus ours: nobody else holds or waits.
        // `remove_if` runs under the shard lock, so a concurrent `slot` call
        // either sees the entry before removal or inserts a fresh one.
        self.table
            .remove_if(&self.object_id, |_, mutex| {
                Arc::ptr_eq(mutex, &self.mutex) && Arc::strong_count(mutex) == 2
            });
    }
}

/// Exclusive access to one object ID; released on drop.
///
/// Fields drop in order: the mutex guard first, then the slot.
#[derive(Debug)]
pub struct PlacementGuard {
    _guard: OwnedMutexGuard<()>,
    _slot: LockSlot,
}
