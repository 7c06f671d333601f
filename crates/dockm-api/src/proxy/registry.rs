//! Concurrent registry of endpoint proxies.
//!
//! Synchronous under the hood (`parking_lot`, not `tokio::sync`): the lock is
//! never held across an `.await`, so callers see plain get/insert/remove with
//! last-write-wins semantics and no external locking contract.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::transport::Proxy;

/// Thread-safe, cloneable map from endpoint key to its live proxy.
#[derive(Debug, Clone, Default)]
pub struct ProxyRegistry {
    proxies: Arc<RwLock<HashMap<String, Arc<Proxy>>>>,
}

impl ProxyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `proxy` under `key`, returning the proxy it replaced.
    pub fn insert(&self, key: String, proxy: Arc<Proxy>) -> Option<Arc<Proxy>> {
        self.proxies.write().insert(key, proxy)
    }

    /// The proxy registered under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<Proxy>> {
        self.proxies.read().get(key).cloned()
    }

    /// Remove and return the proxy registered under `key`.
    pub fn remove(&self, key: &str) -> Option<Arc<Proxy>> {
        self.proxies.write().remove(key)
    }

    /// Number of registered proxies.
    pub fn len(&self) -> usize {
        self.proxies.read().len()
    }

    /// Whether no proxy is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
