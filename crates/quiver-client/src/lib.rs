//! Typed client for a document/vector-store service.
//!
//! A [`Client`] is built from an explicit [`Config`] and hands out three
//! managers that share one [`Transport`]:
//!
//! - [`SchemaManager`]: create, list, inspect and delete collections
//! - [`ObjectStore`]: create, batch-create, count and list records
//! - [`QueryClient`]: filtered retrieval and similarity search
//!
//! The library never prints and never retries; see [`retry`] for an opt-in
//! helper.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod meta;
pub mod objects;
pub mod query;
pub mod retry;
pub mod schema;
pub mod transport;

use std::sync::Arc;

pub use config::{Config, ConfigError, ConnectionParams};
pub use error::{ClientError, ClientResult};
pub use meta::{ModuleInfo, ServerMeta};
pub use objects::{BatchOutcome, BatchReport, ObjectStore};
pub use query::QueryClient;
pub use schema::SchemaManager;
pub use transport::{
    GraphQlError, HttpTransport, Method, QueryReply, Reply, Request, Transport, TransportError,
};

const META_PATH: &str = "v1/meta";
const READY_PATH: &str = "v1/.well-known/ready";

/// Entry point holding the shared transport.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Create a client over HTTP.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] for unusable settings, or
    /// [`ClientError::Transport`] if the HTTP client cannot be built. No
    /// request is made.
    pub fn new(config: &Config) -> ClientResult<Self> {
        let params = config.connection_params()?;
        let transport = HttpTransport::new(&params)?;
        log::debug!("Client configured for {}", transport.base_url());
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Create a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn schema(&self) -> SchemaManager {
        SchemaManager::new(Arc::clone(&self.transport))
    }

    pub fn objects(&self) -> ObjectStore {
        ObjectStore::new(Arc::clone(&self.transport))
    }

    pub fn query(&self) -> QueryClient {
        QueryClient::new(Arc::clone(&self.transport))
    }

    /// Read the service's version and enabled modules.
    pub async fn meta(&self) -> ClientResult<ServerMeta> {
        match self.transport.get(META_PATH, &[]).await? {
            Reply::Success(body) => {
                serde_json::from_value(body).map_err(|e| ClientError::parse("meta", e))
            }
            Reply::HttpError { status, body } => Err(ClientError::http("meta", status, &body)),
        }
    }

    /// Whether the service reports itself ready.
    ///
    /// A non-2xx answer is `false`; an unreachable service is an error.
    pub async fn is_ready(&self) -> ClientResult<bool> {
        match self.transport.get(READY_PATH, &[]).await? {
            Reply::Success(_) => Ok(true),
            Reply::HttpError { status, .. } => {
                log::debug!("Readiness probe answered {status}");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation_makes_no_request() {
        let client = Client::new(&Config::default().with_service_url("http://127.0.0.1:9"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_rejects_bad_config() {
        let result = Client::new(&Config::default().with_service_url("localhost"));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }
}
