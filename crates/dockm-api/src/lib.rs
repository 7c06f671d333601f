//! # dockm-api — Multi-Tenant Control Plane for Container Engines
//!
//! Fronts one or more container-engine HTTP APIs and decides, per request,
//! whether the caller may reach the engine and what the engine's answer may
//! reveal.
//!
//! ## Routes
//!
//! - `/api/status`, `/api/settings` — public
//! - `/api/endpoints/:id/docker/*` — engine API proxy (restricted)
//! - `/api/endpoints` — endpoint listing (restricted) and management (administrator)
//! - `/api/resource_controls/*` — ownership records (restricted)
//! - `/api/teams/:id/memberships`, `/api/users/:id/memberships` — restricted
//! - `/health/*` — liveness and readiness probes (no bouncer level)
//!
//! ## Request Path
//!
//! TraceLayer → [`RequestBouncer`](auth::RequestBouncer) level → handler →
//! [`Proxy`](proxy::Proxy) discipline → upstream engine.
//!
//! ## Crate Policy
//!
//! - Policy decisions live in [`policy`] as pure functions.
//! - Engine traffic only leaves through [`proxy`].
//! - All errors map to structured HTTP responses via `AppError`.

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod policy;
pub mod proxy;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::AppState;

use axum::routing::get;
use axum::Router;

/// Assemble the full application router.
///
/// Each route group is wrapped in exactly one bouncer level before the
/// groups are merged.
pub fn app(state: AppState) -> Router {
    let bouncer = state.bouncer.clone();

    let public = bouncer.public(routes::status::router());
    let restricted = bouncer.restricted(
        Router::new()
            .merge(routes::docker::router())
            .merge(routes::endpoints::restricted_router())
            .merge(routes::resource_controls::router())
            .merge(routes::teams::router()),
    );
    let admin = bouncer.administrator(routes::endpoints::admin_router());

    let api = Router::new()
        .merge(public)
        .merge(restricted)
        .merge(admin)
        .layer(middleware::tracing_layer::layer())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}
