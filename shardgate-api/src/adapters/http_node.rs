//! Storage node connector speaking plain HTTP.
//!
//! Objects live at `{scheme}://{address}/{bucket}/{object_id}`:
//! `GET` reads, `HEAD` probes and `PUT` writes. Buckets are probed with
//! `HEAD /{bucket}` and created with `PUT /{bucket}` before the first write.
//! Every request carries the node's credentials as basic auth.
//!
//! This is a plain HTTP object protocol, not S3: requests are not SigV4
//! signed, so MinIO or other S3 nodes cannot be reached with it directly.
//! Fronting an S3 cluster means supplying another [`ConnectorFactory`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use reqwest::{header::CONTENT_LENGTH, Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use shardgate_core::{
    ConfigError, ConnectionError, ConnectorFactory, GatewayError, GatewayResult, Node, NodeHandle,
    NodeId, ObjectReader,
};
use tokio_util::io::{ReaderStream, StreamReader};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds [`HttpNodeHandle`]s sharing one connection pool.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: Client,
    scheme: &'static str,
}

impl HttpConnector {
    pub fn new() -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                field: "http_client".to_string(),
                value: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            scheme: "http",
        }
    }

    /// Talk to nodes over TLS.
    pub fn with_https(mut self) -> Self {
        self.scheme = "https";
        self
    }
}

#[async_trait]
impl ConnectorFactory for HttpConnector {
    async fn connect(&self, node: &Node) -> GatewayResult<Box<dyn NodeHandle>> {
        let address = node.address.trim().trim_end_matches('/');
        if address.is_empty() {
            return Err(ConnectionError::ConnectFailed {
                node_id: node.id.clone(),
                reason: "node has no address".to_string(),
            }
            .into());
        }

        let secret = node.credentials.secret_access_key().to_string();
        Ok(Box::new(HttpNodeHandle {
            client: self.client.clone(),
            node_id: node.id.clone(),
            base_url: format!("{}://{}", self.scheme, address),
            access_key_id: node.credentials.access_key_id.clone(),
            secret_access_key: SecretString::new(secret.into_boxed_str()),
        }))
    }
}

/// One storage node reached over HTTP.
pub struct HttpNodeHandle {
    client: Client,
    node_id: NodeId,
    base_url: String,
    access_key_id: String,
    secret_access_key: SecretString,
}

impl fmt::Debug for HttpNodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpNodeHandle")
            .field("node_id", &self.node_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpNodeHandle {
    fn bucket_url(&self, bucket: &str) -> String {
        format!("{}/{}", self.base_url, bucket)
    }

    fn object_url(&self, bucket: &str, object_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, bucket, object_id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(
            &self.access_key_id,
            Some(self.secret_access_key.expose_secret()),
        )
    }

    async fn send(&self, request: RequestBuilder) -> GatewayResult<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, reason: impl fmt::Display) -> GatewayError {
        ConnectionError::Transport {
            node_id: self.node_id.clone(),
            reason: reason.to_string(),
        }
        .into()
    }

    fn unexpected_status(&self, method: &str, url: &str, status: StatusCode) -> GatewayError {
        self.transport_error(format!("{} {} returned {}", method, url, status))
    }

    /// Create the bucket unless the node already has it.
    async fn ensure_bucket(&self, bucket: &str) -> GatewayResult<()> {
        let url = self.bucket_url(bucket);
        let probe = self.send(self.client.head(&url)).await?;
        match probe.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            status => return Err(self.unexpected_status("HEAD", &url, status)),
        }

        let created = self.send(self.client.put(&url)).await?;
        match created.status() {
            status if status.is_success() || status == StatusCode::CONFLICT => {
                tracing::debug!(node_id = %self.node_id, bucket, "bucket created");
                Ok(())
            }
            status => Err(self.unexpected_status("PUT", &url, status)),
        }
    }
}

#[async_trait]
impl NodeHandle for HttpNodeHandle {
    async fn read(&self, bucket: &str, object_id: &str) -> GatewayResult<Option<ObjectReader>> {
        let url = self.object_url(bucket, object_id);
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let stream = Box::pin(response.bytes_stream().map_err(std::io::Error::other));
                Ok(Some(Box::new(StreamReader::new(stream))))
            }
            status => Err(self.unexpected_status("GET", &url, status)),
        }
    }

    async fn write(
        &self,
        bucket: &str,
        object_id: &str,
        reader: ObjectReader,
        size_hint: Option<u64>,
    ) -> GatewayResult<()> {
        self.ensure_bucket(bucket).await?;

        let url = self.object_url(bucket, object_id);
        let mut request = self
            .client
            .put(&url)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(reader)));
        if let Some(len) = size_hint {
            request = request.header(CONTENT_LENGTH, len);
        }

        let response = self.send(request).await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.unexpected_status("PUT", &url, response.status()))
        }
    }

    async fn exists(&self, bucket: &str, object_id: &str) -> GatewayResult<bool> {
        let url = self.object_url(bucket, object_id);
        let response = self.send(self.client.head(&url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(self.unexpected_status("HEAD", &url, status)),
        }
    }
}
