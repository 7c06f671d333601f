//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The control plane owns no persistent data. AppState holds:
//! - **Collaborator services** — endpoints, resource controls, team
//!   memberships and settings, behind object-safe traits.
//! - **Proxy manager** — the only shared mutable state: one proxy per endpoint.
//! - **Request bouncer** — token verification and requester-context building.

use std::path::PathBuf;
use std::sync::Arc;

use dockm_core::{
    EndpointService, MemoryStore, ResourceControlService, SettingsService, TeamMembershipService,
    TokenVerifier,
};
use zeroize::Zeroizing;

use crate::auth::RequestBouncer;
use crate::proxy::{ProxyFactory, ProxyManager};

// -- Configuration ------------------------------------------------------------

/// Default listening port.
pub const DEFAULT_PORT: u16 = 9000;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Errors building [`AppConfig`] from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `DOCKM_PORT` is not a valid port number.
    #[error("DOCKM_PORT is not a valid port: {0}")]
    InvalidPort(String),

    /// Authentication is enabled but no signing secret was provided.
    #[error("DOCKM_JWT_SECRET must be set unless DOCKM_NO_AUTH is enabled")]
    MissingSecret,

    /// `DOCKM_LOG_FORMAT` is neither `text` nor `json`.
    #[error("DOCKM_LOG_FORMAT must be \"text\" or \"json\", got \"{0}\"")]
    InvalidLogFormat(String),
}

/// Application configuration.
///
/// Custom `Debug` redacts the signing secret to prevent credential leakage in logs.
#[derive(Clone)]
pub struct AppConfig {
    /// Listening port.
    pub port: u16,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: Option<Zeroizing<String>>,
    /// When false, every request runs as a synthetic administrator.
    pub authentication_enabled: bool,
    /// Seed document loaded into the in-memory store at startup.
    pub data_path: Option<PathBuf>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("authentication_enabled", &self.authentication_enabled)
            .field("data_path", &self.data_path)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            jwt_secret: None,
            authentication_enabled: false,
            data_path: None,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable           | Default | Meaning                              |
    /// |--------------------|---------|--------------------------------------|
    /// | `DOCKM_PORT`       | 9000    | listening port                       |
    /// | `DOCKM_JWT_SECRET` | —       | token signing secret                 |
    /// | `DOCKM_NO_AUTH`    | unset   | `1`/`true`/`yes` disables auth       |
    /// | `DOCKM_DATA`       | unset   | seed document path                   |
    /// | `DOCKM_LOG_FORMAT` | `text`  | `text` or `json`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("DOCKM_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        let authentication_enabled = !lookup("DOCKM_NO_AUTH").is_some_and(|v| {
            matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
        });

        let jwt_secret = lookup("DOCKM_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .map(Zeroizing::new);
        if authentication_enabled && jwt_secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }

        let log_format = match lookup("DOCKM_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidLogFormat(other.to_string())),
        };

        Ok(Self {
            port,
            jwt_secret,
            authentication_enabled,
            data_path: lookup("DOCKM_DATA").filter(|s| !s.is_empty()).map(PathBuf::from),
            log_format,
        })
    }
}

// -- Services -----------------------------------------------------------------

/// The collaborators the control plane consumes.
#[derive(Clone)]
pub struct Services {
    /// Managed endpoint definitions.
    pub endpoints: Arc<dyn EndpointService>,
    /// Resource-control records.
    pub resource_controls: Arc<dyn ResourceControlService>,
    /// Team memberships.
    pub team_memberships: Arc<dyn TeamMembershipService>,
    /// Global settings.
    pub settings: Arc<dyn SettingsService>,
    /// Bearer-token verifier. `None` disables authentication.
    pub tokens: Option<Arc<dyn TokenVerifier>>,
}

impl Services {
    /// Back every storage collaborator with one [`MemoryStore`].
    pub fn in_memory(store: &MemoryStore, tokens: Option<Arc<dyn TokenVerifier>>) -> Self {
        Self {
            endpoints: Arc::new(store.clone()),
            resource_controls: Arc::new(store.clone()),
            team_memberships: Arc::new(store.clone()),
            settings: Arc::new(store.clone()),
            tokens,
        }
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Configuration the process started with.
    pub config: Arc<AppConfig>,
    /// Managed endpoint definitions.
    pub endpoints: Arc<dyn EndpointService>,
    /// Resource-control records.
    pub resource_controls: Arc<dyn ResourceControlService>,
    /// Team memberships.
    pub team_memberships: Arc<dyn TeamMembershipService>,
    /// Global settings.
    pub settings: Arc<dyn SettingsService>,
    /// One live proxy per endpoint.
    pub proxies: ProxyManager,
    /// Access-level middleware.
    pub bouncer: RequestBouncer,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("bouncer", &self.bouncer)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the services into a proxy manager and bouncer.
    pub fn new(config: AppConfig, services: Services) -> Self {
        let bouncer = RequestBouncer::new(services.tokens, Arc::clone(&services.team_memberships));
        let proxies = ProxyManager::new(ProxyFactory::new(
            Arc::clone(&services.resource_controls),
            Arc::clone(&services.settings),
        ));
        Self {
            config: Arc::new(config),
            endpoints: services.endpoints,
            resource_controls: services.resource_controls,
            team_memberships: services.team_memberships,
            settings: services.settings,
            proxies,
            bouncer,
        }
    }
}
