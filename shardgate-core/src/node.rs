//! Storage node connection details.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::NodeId;

/// Access credentials for one storage node.
///
/// The secret is wrapped so it never shows up in `Debug` output or logs.
pub struct Credentials {
    pub access_key_id: String,
    secret_access_key: SecretString,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        let secret: String = secret_access_key.into();
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::new(secret.into_boxed_str()),
        }
    }

    /// Borrow the secret for the duration of a request.
    pub fn secret_access_key(&self) -> &str {
        self.secret_access_key.expose_secret()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// A resolved storage node: identity, network address and credentials.
///
/// Re-resolved on every connection since nodes come and go between calls.
#[derive(Debug)]
pub struct Node {
    pub id: NodeId,
    pub address: String,
    pub credentials: Credentials,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, address: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let node = Node::new(
            "node-1",
            "10.0.0.5:9000",
            Credentials::new("minio", "super-secret"),
        );
        let rendered = format!("{:?}", node);
        assert!(rendered.contains("minio"));
        assert!(!rendered.contains("super-secret"));
        assert_eq!(node.credentials.secret_access_key(), "super-secret");
    }
}
