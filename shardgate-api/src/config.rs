//! Server configuration for the SHARDGATE HTTP front-end.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{ApiError, ApiResult};

/// Ports at or below this value are ignored in favour of the default.
const MIN_PORT: u16 = 1000;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_NODES_FILE: &str = "nodes.toml";

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host or IP the listener binds to.
    pub bind: String,
    pub port: u16,
    /// Path of the TOML file listing storage nodes.
    pub nodes_file: PathBuf,
    /// Verbose logging when set.
    pub log_debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            nodes_file: PathBuf::from(DEFAULT_NODES_FILE),
            log_debug: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SHARDGATE_API_BIND`: bind host (default `0.0.0.0`)
    /// - `PORT`: listen port, used only when above 1000 (default 3000)
    /// - `SHARDGATE_NODES_FILE`: node list (default `nodes.toml`)
    /// - `LOG_DEBUG`: any non-empty value enables debug logging
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind = lookup("SHARDGATE_API_BIND")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.bind);

        let port = lookup("PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .filter(|port| *port > MIN_PORT)
            .unwrap_or(defaults.port);

        let nodes_file = lookup("SHARDGATE_NODES_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.nodes_file);

        let log_debug = lookup("LOG_DEBUG")
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);

        Self {
            bind,
            port,
            nodes_file,
            log_debug,
        }
    }

    /// Resolve the socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::internal_error(format!("Invalid bind address {}: {}", addr, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 3000);
    }

    #[test]
    fn test_port_above_threshold_is_used() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")]));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_low_or_invalid_port_falls_back() {
        for raw in ["80", "1000", "abc", "70000"] {
            let config = ServerConfig::from_lookup(lookup(&[("PORT", raw)]));
            assert_eq!(config.port, 3000, "PORT={} should fall back", raw);
        }
    }

    #[test]
    fn test_log_debug_and_nodes_file() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("LOG_DEBUG", "1"),
            ("SHARDGATE_NODES_FILE", "/etc/shardgate/nodes.toml"),
        ]));
        assert!(config.log_debug);
        assert_eq!(
            config.nodes_file,
            PathBuf::from("/etc/shardgate/nodes.toml")
        );
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        let config = ServerConfig::from_lookup(lookup(&[("SHARDGATE_API_BIND", "not an ip")]));
        assert!(config.bind_addr().is_err());
    }
}
