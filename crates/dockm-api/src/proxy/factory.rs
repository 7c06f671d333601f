//! Builds a [`Proxy`] with the upstream transport selected by the endpoint URL.

use std::sync::Arc;

use dockm_core::{ManagedEndpoint, ResourceControlService, SettingsService, TransportTarget};

use super::transport::Proxy;
use super::upstream::{HttpUpstream, Upstream};
use super::ProxyError;

/// Creates proxies bound to the services they consult on every call.
#[derive(Clone)]
pub struct ProxyFactory {
    resource_controls: Arc<dyn ResourceControlService>,
    settings: Arc<dyn SettingsService>,
}

impl std::fmt::Debug for ProxyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyFactory").finish_non_exhaustive()
    }
}

impl ProxyFactory {
    /// Create a factory.
    pub fn new(
        resource_controls: Arc<dyn ResourceControlService>,
        settings: Arc<dyn SettingsService>,
    ) -> Self {
        Self {
            resource_controls,
            settings,
        }
    }

    /// Build a proxy for `endpoint`:
    /// `unix://` → local socket, `tcp://` → plain HTTP, `tcp://` with TLS
    /// material → mutually authenticated HTTPS.
    pub async fn create(&self, endpoint: &ManagedEndpoint) -> Result<Proxy, ProxyError> {
        let upstream: Arc<dyn Upstream> = match endpoint.transport()? {
            TransportTarget::Socket { path } => socket_upstream(path)?,
            TransportTarget::Tcp { authority } => Arc::new(HttpUpstream::plain(&authority)?),
            TransportTarget::TcpTls {
                authority,
                material,
            } => Arc::new(HttpUpstream::tls(&authority, &material).await?),
        };
        Ok(Proxy::new(
            upstream,
            Arc::clone(&self.resource_controls),
            Arc::clone(&self.settings),
        ))
    }
}

#[cfg(unix)]
fn socket_upstream(path: std::path::PathBuf) -> Result<Arc<dyn Upstream>, ProxyError> {
    Ok(Arc::new(super::upstream::SocketUpstream::new(path)))
}

#[cfg(not(unix))]
fn socket_upstream(path: std::path::PathBuf) -> Result<Arc<dyn Upstream>, ProxyError> {
    Err(ProxyError::Transport(format!(
        "local sockets are not supported on this platform: {}",
        path.display()
    )))
}
