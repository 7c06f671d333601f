//! # Resource-Control Routes
//!
//! Create, update and delete ownership records. All three are restricted and
//! enforce the matching policy: creation for `POST`, ownership plus update for
//! `PUT`, deletion for `DELETE`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};
use dockm_core::{ResourceControl, ResourceControlId, ResourceType, TeamId, UserId};
use serde::Deserialize;

use crate::auth::RequesterContext;
use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, Validate};
use crate::policy::{
    authorized_resource_access, authorized_resource_control_creation,
    authorized_resource_control_deletion, authorized_resource_control_update,
};
use crate::state::AppState;

/// Request to create a resource control.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateResourceControlRequest {
    /// Engine identifier of the resource.
    #[serde(rename = "ResourceID")]
    pub resource_id: String,
    /// Kind of resource.
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,
    /// Restrict the resource to administrators.
    #[serde(default)]
    pub administrators_only: bool,
    /// Users to grant.
    #[serde(default)]
    pub users: Vec<UserId>,
    /// Teams to grant.
    #[serde(default)]
    pub teams: Vec<TeamId>,
}

impl Validate for CreateResourceControlRequest {
    fn validate(&self) -> Result<(), String> {
        if self.resource_id.trim().is_empty() {
            return Err("ResourceID must not be empty".into());
        }
        validate_grants(self.administrators_only, &self.users, &self.teams)
    }
}

/// Request to change the grants of a resource control.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateResourceControlRequest {
    /// Restrict the resource to administrators.
    #[serde(default)]
    pub administrators_only: bool,
    /// Users to grant.
    #[serde(default)]
    pub users: Vec<UserId>,
    /// Teams to grant.
    #[serde(default)]
    pub teams: Vec<TeamId>,
}

impl Validate for UpdateResourceControlRequest {
    fn validate(&self) -> Result<(), String> {
        validate_grants(self.administrators_only, &self.users, &self.teams)
    }
}

fn validate_grants(administrators_only: bool, users: &[UserId], teams: &[TeamId]) -> Result<(), String> {
    if administrators_only && (!users.is_empty() || !teams.is_empty()) {
        return Err("an administrators-only resource control cannot grant users or teams".into());
    }
    Ok(())
}

/// Restricted routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/resource_controls", post(create_resource_control))
        .route(
            "/api/resource_controls/:id",
            put(update_resource_control).delete(delete_resource_control),
        )
}

async fn create_resource_control(
    State(state): State<AppState>,
    requester: RequesterContext,
    body: Result<Json<CreateResourceControlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ResourceControl>), AppError> {
    let req = extract_validated_json(body)?;
    let control = ResourceControl {
        id: ResourceControlId(0),
        resource_id: req.resource_id,
        resource_type: req.resource_type,
        administrators_only: req.administrators_only,
        user_accesses: req.users,
        team_accesses: req.teams,
    };
    if !authorized_resource_control_creation(&control, &requester) {
        tracing::warn!(
            user_id = %requester.user_id,
            resource_id = %control.resource_id,
            "resource control creation denied"
        );
        return Err(AppError::Forbidden(
            "permission denied to create this resource control".into(),
        ));
    }

    let created = state
        .resource_controls
        .create_resource_control(control)
        .await?;
    tracing::info!(id = %created.id, resource_id = %created.resource_id, "resource control created");
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_resource_control(
    State(state): State<AppState>,
    requester: RequesterContext,
    path: Result<Path<ResourceControlId>, PathRejection>,
    body: Result<Json<UpdateResourceControlRequest>, JsonRejection>,
) -> Result<Json<ResourceControl>, AppError> {
    let id = extract_path(path)?;
    let req = extract_validated_json(body)?;
    let existing = state.resource_controls.resource_control(id).await?;
    if !authorized_resource_access(&existing, &requester) {
        return Err(AppError::Forbidden(
            "access denied to this resource control".into(),
        ));
    }

    let updated = ResourceControl {
        administrators_only: req.administrators_only,
        user_accesses: req.users,
        team_accesses: req.teams,
        ..existing
    };
    if !authorized_resource_control_update(&updated, &requester) {
        tracing::warn!(user_id = %requester.user_id, id = %id, "resource control update denied");
        return Err(AppError::Forbidden(
            "permission denied to update this resource control".into(),
        ));
    }

    Ok(Json(
        state
            .resource_controls
            .update_resource_control(id, updated)
            .await?,
    ))
}

async fn delete_resource_control(
    State(state): State<AppState>,
    requester: RequesterContext,
    path: Result<Path<ResourceControlId>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let id = extract_path(path)?;
    let existing = state.resource_controls.resource_control(id).await?;
    if !authorized_resource_control_deletion(&existing, &requester) {
        tracing::warn!(user_id = %requester.user_id, id = %id, "resource control deletion denied");
        return Err(AppError::Forbidden(
            "permission denied to delete this resource control".into(),
        ));
    }
    state.resource_controls.delete_resource_control(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
