//! Concrete discovery and storage adapters.

mod file_directory;
mod http_node;

pub use file_directory::FileNodeDirectory;
pub use http_node::{HttpConnector, HttpNodeHandle};
