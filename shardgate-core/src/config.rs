//! Gateway configuration.
//!
//! Loaded from environment variables with defaults that match a local
//! docker-compose cluster, or deserialized from any serde source.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Default selector used to discover storage nodes.
pub const DEFAULT_SELECTOR: &str = "amazin-object-storage-node";

/// Default bucket for read/write operations.
pub const DEFAULT_BUCKET: &str = "store";

// ============================================================================
// PLACEMENT HASH
// ============================================================================

/// Hash function used to place brand-new objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementHash {
    /// 64-bit FNV-1a over the UTF-8 bytes of the object ID.
    #[default]
    Fnv1a,
    /// Wrapping 32-bit sum of code points. Keeps historical placements.
    LegacySum,
}

impl PlacementHash {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementHash::Fnv1a => "fnv1a",
            PlacementHash::LegacySum => "legacy-sum",
        }
    }
}

impl fmt::Display for PlacementHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlacementHash {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fnv1a" | "fnv-1a" => Ok(PlacementHash::Fnv1a),
            "legacy-sum" | "legacy" => Ok(PlacementHash::LegacySum),
            other => Err(ConfigError::InvalidValue {
                field: "placement_hash".to_string(),
                value: other.to_string(),
                reason: "expected one of: fnv1a, legacy-sum".to_string(),
            }),
        }
    }
}

// ============================================================================
// GATEWAY CONFIG
// ============================================================================

/// Routing gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Selector passed to the node directory to identify storage nodes.
    pub selector: String,
    /// Bucket used on every node.
    pub bucket: String,
    /// Hash used to place objects never seen before.
    pub placement_hash: PlacementHash,
    /// Deadline for a whole read or write, in milliseconds. `None` disables it.
    pub operation_timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            selector: DEFAULT_SELECTOR.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
            placement_hash: PlacementHash::default(),
            operation_timeout_ms: None,
        }
    }
}

impl GatewayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create GatewayConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SHARDGATE_SELECTOR`: node selector (default: `amazin-object-storage-node`)
    /// - `SHARDGATE_BUCKET`: bucket name (default: `store`)
    /// - `SHARDGATE_PLACEMENT_HASH`: `fnv1a` or `legacy-sum` (default: `fnv1a`)
    /// - `SHARDGATE_OPERATION_TIMEOUT_MS`: per-operation deadline (default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(selector) = non_empty_env("SHARDGATE_SELECTOR") {
            config.selector = selector;
        }
        if let Some(bucket) = non_empty_env("SHARDGATE_BUCKET") {
            config.bucket = bucket;
        }
        if let Some(hash) = non_empty_env("SHARDGATE_PLACEMENT_HASH") {
            config.placement_hash = hash.parse()?;
        }
        if let Some(timeout) = non_empty_env("SHARDGATE_OPERATION_TIMEOUT_MS") {
            let ms = timeout.parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                field: "operation_timeout_ms".to_string(),
                value: timeout.clone(),
                reason: e.to_string(),
            })?;
            config.operation_timeout_ms = Some(ms);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check invariants the gateway relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selector.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "selector".to_string(),
            });
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "bucket".to_string(),
            });
        }
        if self.operation_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "operation_timeout_ms".to_string(),
                value: "0".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = selector.into();
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    pub fn with_placement_hash(mut self, hash: PlacementHash) -> Self {
        self.placement_hash = hash;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
