//! SHARDGATE HTTP API
//!
//! Axum front-end for the routing gateway plus the adapters it runs with in
//! production: a file-backed node directory and an HTTP storage connector.

pub mod adapters;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod validation;

pub use adapters::{FileNodeDirectory, HttpConnector, HttpNodeHandle};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
pub use validation::validate_object_id;
