//! # Bootstrap
//!
//! Builds [`AppState`] from [`AppConfig`] at startup.
//!
//! ## Sequence
//!
//! 1. **Load Seed** — when `DOCKM_DATA` is set, parse the seed document into
//!    the in-memory store; otherwise start empty.
//! 2. **Token Verifier** — an HS256 [`JwtService`] when authentication is
//!    enabled.
//! 3. **Register Proxies** — one proxy per known endpoint. A failure is
//!    logged and the proxy is created lazily on first use instead.

use std::sync::Arc;

use dockm_core::{MemoryStore, Seed, SeedError, TokenVerifier};

use crate::auth::JwtService;
use crate::state::{AppConfig, AppState, ConfigError, Services};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors during bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The seed document could not be loaded.
    #[error(transparent)]
    Seed(#[from] SeedError),

    /// The configuration is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Build the application state described by `config`.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    let store = load_store(&config)?;

    let tokens: Option<Arc<dyn TokenVerifier>> = if config.authentication_enabled {
        let secret = config
            .jwt_secret
            .as_ref()
            .ok_or(ConfigError::MissingSecret)?;
        Some(Arc::new(JwtService::new(secret.as_bytes())))
    } else {
        tracing::warn!("authentication disabled: every request runs as administrator");
        None
    };

    let state = AppState::new(config, Services::in_memory(&store, tokens));
    register_endpoint_proxies(&state).await;
    Ok(state)
}

fn load_store(config: &AppConfig) -> Result<MemoryStore, BootstrapError> {
    let Some(path) = &config.data_path else {
        tracing::info!("DOCKM_DATA not set, starting with an empty store");
        return Ok(MemoryStore::new());
    };
    let seed = Seed::load(path)?;
    tracing::info!(
        path = %path.display(),
        endpoints = seed.endpoints.len(),
        team_memberships = seed.team_memberships.len(),
        resource_controls = seed.resource_controls.len(),
        "loaded seed document"
    );
    Ok(MemoryStore::from_seed(seed)?)
}

async fn register_endpoint_proxies(state: &AppState) {
    let endpoints = match state.endpoints.endpoints().await {
        Ok(endpoints) => endpoints,
        Err(err) => {
            tracing::warn!(error = %err, "could not list endpoints, proxies will be created on first use");
            return;
        }
    };
    for endpoint in endpoints {
        if let Err(err) = state.proxies.create_and_register_proxy(&endpoint).await {
            tracing::warn!(
                endpoint_id = %endpoint.id,
                error = %err,
                "endpoint proxy not registered, will retry on first use"
            );
        }
    }
}
