//! Public status and settings.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use dockm_core::Settings;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusResponse {
    /// Whether bearer tokens are verified.
    pub authentication: bool,
    /// Server version.
    pub version: &'static str,
}

/// Public routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/settings", get(settings))
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        authentication: state.bouncer.authentication_enabled(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn settings(State(state): State<AppState>) -> Result<Json<Settings>, AppError> {
    Ok(Json(state.settings.settings().await?))
}
