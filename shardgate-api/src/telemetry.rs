//! Tracing subscriber setup.
//!
//! Logs are emitted as JSON lines. `RUST_LOG` wins when set; otherwise the
//! level is debug for SHARDGATE crates when `LOG_DEBUG` is on, error when off.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{ApiError, ApiResult};

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "shardgate_api=debug,shardgate_routing=debug,tower_http=debug,info"
    } else {
        "error"
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_tracing(verbose: bool) -> ApiResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()
        .map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::debug!(verbose, "Telemetry initialized");
    Ok(())
}
