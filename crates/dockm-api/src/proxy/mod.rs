//! # Endpoint Proxies
//!
//! One [`Proxy`] per managed endpoint forwards container-engine API calls and
//! enforces ownership on the way through.
//!
//! ## Modules
//!
//! - [`registry`] — concurrent key→proxy map, last write wins.
//! - [`factory`] — builds a proxy with the right upstream transport.
//! - [`upstream`] — socket and HTTP(S) transports.
//! - [`router`] — ordered route table classifying each call into a discipline.
//! - [`rewrite`] — schema-less JSON decoration, filtering and denial.
//! - [`transport`] — executes a classified call.

pub mod factory;
pub mod registry;
pub mod rewrite;
pub mod router;
pub mod transport;
pub mod upstream;

use std::sync::Arc;

use dockm_core::{EndpointError, ManagedEndpoint, ServiceError};
use thiserror::Error;

pub use factory::ProxyFactory;
pub use registry::ProxyRegistry;
pub use rewrite::ShapeError;
pub use router::{classify, Discipline, Operation, PathError};
pub use transport::Proxy;
pub use upstream::{Upstream, UpstreamRequest};

/// Errors raised while building a proxy or forwarding through it.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Socket, connection or protocol failure talking to the engine.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// TLS material could not be read or is invalid.
    #[error("TLS configuration error: {0}")]
    Tls(String),

    /// The endpoint URL does not describe a supported transport.
    #[error("unsupported endpoint: {0}")]
    UnsupportedEndpoint(#[from] EndpointError),

    /// The engine path was ambiguous or malformed and was not forwarded.
    #[error("rejected engine path: {0}")]
    Path(#[from] PathError),

    /// The engine's response did not have the expected JSON shape.
    #[error("unexpected upstream response: {0}")]
    Shape(#[from] ShapeError),

    /// A collaborator service failed while building the request snapshot.
    #[error("service error: {0}")]
    Service(#[from] ServiceError),
}

/// Creates, looks up and removes the proxy of each managed endpoint.
#[derive(Debug, Clone)]
pub struct ProxyManager {
    factory: ProxyFactory,
    registry: ProxyRegistry,
}

impl ProxyManager {
    /// Create a manager with an empty registry.
    pub fn new(factory: ProxyFactory) -> Self {
        Self {
            factory,
            registry: ProxyRegistry::new(),
        }
    }

    /// Build a proxy for `endpoint` and register it under the endpoint's key,
    /// replacing any previous proxy. On error the previous entry is untouched.
    pub async fn create_and_register_proxy(
        &self,
        endpoint: &ManagedEndpoint,
    ) -> Result<Arc<Proxy>, ProxyError> {
        let proxy = Arc::new(self.factory.create(endpoint).await?);
        let replaced = self.registry.insert(endpoint.key(), Arc::clone(&proxy));
        tracing::info!(
            endpoint_id = %endpoint.id,
            upstream = %proxy.upstream_description(),
            replaced = replaced.is_some(),
            "registered endpoint proxy"
        );
        Ok(proxy)
    }

    /// The proxy registered under `key`, if any.
    pub fn get_proxy(&self, key: &str) -> Option<Arc<Proxy>> {
        self.registry.get(key)
    }

    /// Remove the proxy registered under `key`.
    pub fn delete_proxy(&self, key: &str) {
        if self.registry.remove(key).is_some() {
            tracing::info!(endpoint_key = key, "removed endpoint proxy");
        }
    }

    /// The registered proxy for `endpoint`, created on first use.
    pub async fn get_or_create_proxy(
        &self,
        endpoint: &ManagedEndpoint,
    ) -> Result<Arc<Proxy>, ProxyError> {
        match self.get_proxy(&endpoint.key()) {
            Some(proxy) => Ok(proxy),
            None => self.create_and_register_proxy(endpoint).await,
        }
    }
}
