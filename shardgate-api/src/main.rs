//! SHARDGATE gateway entry point.
//!
//! Reads configuration from the environment, wires the file node directory
//! and HTTP connector into the routing gateway, and serves the object API.

use std::sync::Arc;

use shardgate_api::telemetry::init_tracing;
use shardgate_api::{
    create_router, ApiError, ApiResult, AppState, FileNodeDirectory, HttpConnector, ServerConfig,
};
use shardgate_core::GatewayConfig;
use shardgate_routing::Gateway;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let server_config = ServerConfig::from_env();
    init_tracing(server_config.log_debug)?;

    let gateway_config = GatewayConfig::from_env()?;
    let directory = Arc::new(FileNodeDirectory::new(&server_config.nodes_file));
    let connector = Arc::new(HttpConnector::new()?);

    tracing::info!(
        selector = %gateway_config.selector,
        bucket = %gateway_config.bucket,
        placement_hash = %gateway_config.placement_hash,
        nodes_file = %directory.path().display(),
        "Gateway configured"
    );

    let gateway = Gateway::builder(gateway_config)
        .with_directory(directory.clone())
        .with_credentials(directory)
        .with_connector(connector)
        .build()?;

    let app = create_router(AppState::new(gateway));

    let addr = server_config.bind_addr()?;
    tracing::info!(%addr, "Starting SHARDGATE gateway");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
