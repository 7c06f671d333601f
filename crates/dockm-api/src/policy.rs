//! # Authorization Policy
//!
//! Pure predicates over a [`ResourceControl`] (or a team/user identifier) and
//! the [`RequesterContext`] of the caller. Administrators pass every check.
//!
//! Creation and update restrict what a non-administrator may grant: at most
//! one user (themself), never a user and a team together, and only teams they
//! belong to. On update a non-administrator may not grant any user at all.

use dockm_core::{ManagedEndpoint, ResourceControl, TeamId, UserId};

use crate::auth::RequesterContext;

/// Ownership: whether the caller may see and act on the controlled resource.
pub fn authorized_resource_access(control: &ResourceControl, context: &RequesterContext) -> bool {
    context.is_admin || control.is_owned_by(context.user_id, &context.memberships)
}

/// Whether the caller may delete `control`.
pub fn authorized_resource_control_deletion(
    control: &ResourceControl,
    context: &RequesterContext,
) -> bool {
    if context.is_admin {
        return true;
    }
    if control.administrators_only {
        return false;
    }
    control
        .team_accesses
        .iter()
        .any(|team| context.is_member_of(*team))
        || control.user_accesses.contains(&context.user_id)
}

/// Whether the caller may create `control`.
pub fn authorized_resource_control_creation(
    control: &ResourceControl,
    context: &RequesterContext,
) -> bool {
    if context.is_admin {
        return true;
    }
    if control.administrators_only {
        return false;
    }

    let users = control.user_accesses.len();
    let teams = control.team_accesses.len();
    if users > 1 || (users == 1 && teams == 1) {
        return false;
    }
    if users == 1 && control.user_accesses[0] != context.user_id {
        return false;
    }
    control
        .team_accesses
        .iter()
        .all(|team| context.is_member_of(*team))
}

/// Whether the caller may replace an existing record with `control`.
pub fn authorized_resource_control_update(
    control: &ResourceControl,
    context: &RequesterContext,
) -> bool {
    if !context.is_admin && !control.user_accesses.is_empty() {
        return false;
    }
    authorized_resource_control_creation(control, context)
}

/// Whether the caller may manage the memberships of `team_id`.
pub fn authorized_team_management(team_id: TeamId, context: &RequesterContext) -> bool {
    context.is_admin || context.is_leader_of(team_id)
}

/// Whether the caller may manage the account `user_id`.
pub fn authorized_user_management(user_id: UserId, context: &RequesterContext) -> bool {
    context.is_admin || context.user_id == user_id
}

/// Whether the caller may use `endpoint` at all.
pub fn authorized_endpoint_access(endpoint: &ManagedEndpoint, context: &RequesterContext) -> bool {
    context.is_admin || endpoint.is_authorized(context.user_id, &context.memberships)
}
