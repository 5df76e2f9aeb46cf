//! Home-node selection for objects the cluster has never seen.
//!
//! Placement is a pure function of the object ID and the candidate set:
//! candidates are sorted, the object ID is hashed, and the hash picks a slot.
//! It is stable only while the node set is fixed; objects that already exist
//! are located by the cache and the existence scan, never by re-deriving
//! their placement.

use std::fmt;
use std::sync::Arc;

use shardgate_core::{NodeId, ObjectId, PlacementHash};

// ============================================================================
// HASH FUNCTIONS
// ============================================================================

/// Deterministic, non-cryptographic string hash used for placement.
pub trait HashFunction: Send + Sync + fmt::Debug {
    fn hash(&self, key: &str) -> u64;
}

/// 64-bit FNV-1a.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fnv1a;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl HashFunction for Fnv1a {
    fn hash(&self, key: &str) -> u64 {
        key.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
    }
}

/// Sum of Unicode code points in a wrapping `i32`.
///
/// Poorly distributed; only kept so clusters placed with it don't move.
/// The wrapped value is reinterpreted as unsigned before the modulus.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacySum;

impl LegacySum {
    pub fn sum(key: &str) -> i32 {
        key.chars()
            .fold(0i32, |acc, c| acc.wrapping_add(c as u32 as i32))
    }
}

impl HashFunction for LegacySum {
    fn hash(&self, key: &str) -> u64 {
        u64::from(Self::sum(key) as u32)
    }
}

/// Instantiate the hash function selected in configuration.
pub fn hash_function_for(kind: PlacementHash) -> Arc<dyn HashFunction> {
    match kind {
        PlacementHash::Fnv1a => Arc::new(Fnv1a),
        PlacementHash::LegacySum => Arc::new(LegacySum),
    }
}

// ============================================================================
// PLACEMENT
// ============================================================================

/// Picks the home node for a new object.
#[derive(Debug, Clone)]
pub struct Placement {
    hasher: Arc<dyn HashFunction>,
}

impl Placement {
    pub fn new(hasher: Arc<dyn HashFunction>) -> Self {
        Self { hasher }
    }

    pub fn from_kind(kind: PlacementHash) -> Self {
        Self::new(hash_function_for(kind))
    }

    /// Select one node from `candidates` for `object_id`.
    ///
    /// Returns `None` only for an empty candidate set. Duplicate IDs count
    /// once. A single candidate is returned without hashing.
    pub fn place(&self, object_id: &ObjectId, candidates: &[NodeId]) -> Option<NodeId> {
        match candidates {
            [] => None,
            [only] => Some(only.clone()),
            _ => {
                let mut ids: Vec<&NodeId> = candidates.iter().collect();
                ids.sort();
                ids.dedup();
                let slot = self.hasher.hash(object_id.as_str()) % ids.len() as u64;
                Some(ids[slot as usize].clone())
            }
        }
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::from_kind(PlacementHash::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(names: &[&str]) -> Vec<NodeId> {
        names.iter().map(|n| NodeId::from(*n)).collect()
    }

    fn oid(s: &str) -> ObjectId {
        ObjectId::new(s).unwrap()
    }

    #[test]
    fn test_fnv1a_reference_vectors() {
        assert_eq!(Fnv1a.hash(""), 0xcbf29ce484222325);
        assert_eq!(Fnv1a.hash("a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_legacy_sum_table() {
        assert_eq!(LegacySum::sum("1"), 49);
        assert_eq!(LegacySum::sum("foo"), 324);
        assert_eq!(LegacySum::sum("FOo0"), 308);
    }

    #[test]
    fn test_legacy_sum_wraps_instead_of_panicking() {
        let key: String = std::iter::repeat('\u{10FFFF}').take(2_000).collect();
        let expected = (0..2_000).fold(0i32, |acc, _| acc.wrapping_add(0x10FFFF));
        assert_eq!(LegacySum::sum(&key), expected);
    }

    #[test]
    fn test_legacy_placement_matches_historical_table() {
        let placement = Placement::from_kind(PlacementHash::LegacySum);
        let nodes = ids(&["foo", "bar", "baz"]);
        assert_eq!(placement.place(&oid("1"), &nodes), Some(NodeId::from("baz")));
        assert_eq!(placement.place(&oid("foo"), &nodes), Some(NodeId::from("bar")));
        assert_eq!(placement.place(&oid("FOo0"), &nodes), Some(NodeId::from("foo")));
    }

    #[test]
    fn test_empty_candidates() {
        assert_eq!(Placement::default().place(&oid("foo"), &[]), None);
    }

    #[test]
    fn test_single_candidate_skips_hash() {
        #[derive(Debug)]
        struct Exploding;
        impl HashFunction for Exploding {
            fn hash(&self, _key: &str) -> u64 {
                panic!("hash must not be computed for a single candidate");
            }
        }

        let placement = Placement::new(Arc::new(Exploding));
        assert_eq!(
            placement.place(&oid("anything"), &ids(&["solo"])),
            Some(NodeId::from("solo"))
        );
    }

    #[test]
    fn test_foo_over_abc_is_stable() {
        let placement = Placement::default();
        let nodes = ids(&["a", "b", "c"]);
        let first = placement.place(&oid("foo"), &nodes).unwrap();
        for _ in 0..1000 {
            assert_eq!(placement.place(&oid("foo"), &nodes).as_ref(), Some(&first));
        }
    }

    #[test]
    fn test_duplicates_count_once() {
        let placement = Placement::from_kind(PlacementHash::LegacySum);
        // 324 % 3 == 0 over [bar, baz, foo]
        let nodes = ids(&["foo", "bar", "bar", "baz", "foo"]);
        assert_eq!(placement.place(&oid("foo"), &nodes), Some(NodeId::from("bar")));
    }

    proptest! {
        #[test]
        fn prop_placement_is_deterministic(
            id in "[a-zA-Z0-9]{1,32}",
            nodes in prop::collection::vec("[a-z]{1,8}", 1..12),
        ) {
            let placement = Placement::default();
            let nodes: Vec<NodeId> = nodes.into_iter().map(NodeId::from).collect();
            let object = ObjectId::new(id).unwrap();
            let first = placement.place(&object, &nodes);
            let second = placement.place(&object, &nodes);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_placement_ignores_candidate_order(
            id in "[a-zA-Z0-9]{1,32}",
            nodes in prop::collection::vec("[a-z]{1,8}", 1..12),
        ) {
            let placement = Placement::default();
            let forward: Vec<NodeId> = nodes.iter().cloned().map(NodeId::from).collect();
            let mut reversed = forward.clone();
            reversed.reverse();
            let object = ObjectId::new(id).unwrap();
            prop_assert_eq!(
                placement.place(&object, &forward),
                placement.place(&object, &reversed)
            );
        }

        #[test]
        fn prop_placement_picks_a_candidate(
            id in "[a-zA-Z0-9]{1,32}",
            nodes in prop::collection::vec("[a-z]{1,8}", 1..12),
            legacy in any::<bool>(),
        ) {
            let kind = if legacy { PlacementHash::LegacySum } else { PlacementHash::Fnv1a };
            let placement = Placement::from_kind(kind);
            let nodes: Vec<NodeId> = nodes.into_iter().map(NodeId::from).collect();
            let chosen = placement.place(&ObjectId::new(id).unwrap(), &nodes).unwrap();
            prop_assert!(nodes.contains(&chosen));
        }
    }
}
