//! SHARDGATE Routing - Placement, Location Cache and Gateway
//!
//! Decides which storage node owns an object, remembers that decision and
//! reconciles cache misses by probing the cluster through the ports defined
//! in `shardgate-core`.

pub mod cache;
pub mod gateway;
pub mod locks;
pub mod placement;

pub use cache::{CacheStats, InMemoryLocationCache, LocationCache};
pub use gateway::{Gateway, GatewayBuilder};
pub use locks::{PlacementGuard, PlacementLocks};
pub use placement::{hash_function_for, Fnv1a, HashFunction, LegacySum, Placement};
