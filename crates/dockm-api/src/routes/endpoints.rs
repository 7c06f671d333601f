//! # Endpoint Management Routes
//!
//! | Method   | Path                  | Level         |
//! |----------|-----------------------|---------------|
//! | `GET`    | `/api/endpoints`      | restricted    |
//! | `PUT`    | `/api/endpoints/:id`  | administrator |
//! | `DELETE` | `/api/endpoints/:id`  | administrator |
//!
//! An update whose URL or TLS material changes re-registers the endpoint's
//! proxy before the new definition is stored, so a broken transport never
//! replaces a working one.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use dockm_core::{EndpointId, ManagedEndpoint, TeamId, TlsMaterial, UserId};
use serde::Deserialize;

use crate::auth::RequesterContext;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, Validate};
use crate::policy::authorized_endpoint_access;
use crate::state::AppState;

/// Replacement definition for an endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointUpdateRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// `unix://` or `tcp://` URL.
    #[serde(rename = "URL")]
    pub url: String,
    /// TLS material; absent for plain TCP and sockets.
    #[serde(default, rename = "TLS")]
    pub tls: Option<TlsMaterial>,
    /// Users allowed to use the endpoint.
    #[serde(default)]
    pub authorized_users: Vec<UserId>,
    /// Teams allowed to use the endpoint.
    #[serde(default)]
    pub authorized_teams: Vec<TeamId>,
}

impl Validate for EndpointUpdateRequest {
    fn validate(&self) -> Result<(), String> {
        if self.url.trim().is_empty() {
            return Err("URL must not be empty".into());
        }
        Ok(())
    }
}

/// Restricted routes.
pub fn restricted_router() -> Router<AppState> {
    Router::new().route("/api/endpoints", get(list_endpoints))
}

/// Administrator routes.
pub fn admin_router() -> Router<AppState> {
    Router::new().route(
        "/api/endpoints/:id",
        put(update_endpoint).delete(delete_endpoint),
    )
}

async fn list_endpoints(
    State(state): State<AppState>,
    requester: RequesterContext,
) -> Result<Json<Vec<ManagedEndpoint>>, AppError> {
    let endpoints = state.endpoints.endpoints().await?;
    Ok(Json(
        endpoints
            .into_iter()
            .filter(|endpoint| authorized_endpoint_access(endpoint, &requester))
            .collect(),
    ))
}

async fn update_endpoint(
    State(state): State<AppState>,
    path: Result<Path<EndpointId>, PathRejection>,
    body: Result<Json<EndpointUpdateRequest>, JsonRejection>,
) -> Result<Json<ManagedEndpoint>, AppError> {
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;
    let existing = state.endpoints.endpoint(id).await?;

    let updated = ManagedEndpoint {
        id,
        name: req.name,
        url: req.url,
        tls: req.tls,
        authorized_users: req.authorized_users,
        authorized_teams: req.authorized_teams,
    };
    updated
        .transport()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let transport_changed = existing.url != updated.url || existing.tls != updated.tls;
    if transport_changed {
        state.proxies.create_and_register_proxy(&updated).await?;
    }
    state.endpoints.update_endpoint(updated.clone()).await?;
    tracing::info!(endpoint_id = %id, transport_changed, "endpoint updated");
    Ok(Json(updated))
}

async fn delete_endpoint(
    State(state): State<AppState>,
    path: Result<Path<EndpointId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = extract_path(path)?;
    state.endpoints.delete_endpoint(id).await?;
    state.proxies.delete_proxy(&id.to_string());
    tracing::info!(endpoint_id = %id, "endpoint deleted");
    Ok(StatusCode::NO_CONTENT)
}
