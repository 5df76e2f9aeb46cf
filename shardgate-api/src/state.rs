//! Shared handler state.

use std::sync::Arc;

use shardgate_routing::Gateway;

/// State handed to every route handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway: Arc::new(gateway),
        }
    }
}
