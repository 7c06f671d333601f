//! Team and user membership views.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use dockm_core::{TeamId, TeamMembership, UserId};

use crate::auth::RequesterContext;
use crate::error::AppError;
use crate::extractors::extract_path;
use crate::policy::{authorized_team_management, authorized_user_management};
use crate::state::AppState;

/// Restricted routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/teams/:id/memberships", get(team_memberships))
        .route("/api/users/:id/memberships", get(user_memberships))
}

async fn team_memberships(
    State(state): State<AppState>,
    requester: RequesterContext,
    path: Result<Path<TeamId>, PathRejection>,
) -> Result<Json<Vec<TeamMembership>>, AppError> {
    let team_id = extract_path(path)?;
    if !authorized_team_management(team_id, &requester) {
        return Err(AppError::Forbidden(
            "access denied to team memberships".into(),
        ));
    }
    Ok(Json(
        state
            .team_memberships
            .team_memberships_by_team_id(team_id)
            .await?,
    ))
}

async fn user_memberships(
    State(state): State<AppState>,
    requester: RequesterContext,
    path: Result<Path<UserId>, PathRejection>,
) -> Result<Json<Vec<TeamMembership>>, AppError> {
    let user_id = extract_path(path)?;
    if !authorized_user_management(user_id, &requester) {
        return Err(AppError::Forbidden(
            "access denied to user memberships".into(),
        ));
    }
    Ok(Json(
        state
            .team_memberships
            .team_memberships_by_user_id(user_id)
            .await?,
    ))
}
