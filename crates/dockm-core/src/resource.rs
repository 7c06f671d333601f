//! # Resource Controls
//!
//! A [`ResourceControl`] binds one engine-side resource (container, service,
//! or volume) to the users and teams allowed to see and act on it. At most one
//! record exists per resource identifier.

use serde::{Deserialize, Serialize};

use crate::identity::{TeamId, TeamMembership, UserId};

/// Identifier of a resource control record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceControlId(pub u32);

impl std::fmt::Display for ResourceControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of engine resource a control applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    /// A container, keyed by its full container ID.
    Container,
    /// A swarm service, keyed by its service ID.
    Service,
    /// A volume, keyed by its name.
    Volume,
}

/// Ownership record for one engine resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceControl {
    /// Record identifier.
    pub id: ResourceControlId,
    /// Engine identifier of the controlled resource.
    pub resource_id: String,
    /// Kind of the controlled resource.
    #[serde(rename = "Type")]
    pub resource_type: ResourceType,
    /// When set, only administrators may access the resource.
    #[serde(default)]
    pub administrators_only: bool,
    /// Users granted access.
    #[serde(default)]
    pub user_accesses: Vec<UserId>,
    /// Teams granted access.
    #[serde(default)]
    pub team_accesses: Vec<TeamId>,
}

impl ResourceControl {
    /// Whether a non-administrator with the given team memberships owns this
    /// resource: the record is not administrators-only and the user is listed
    /// directly or through one of their teams.
    pub fn is_owned_by(&self, user_id: UserId, memberships: &[TeamMembership]) -> bool {
        if self.administrators_only {
            return false;
        }
        self.user_accesses.contains(&user_id)
            || memberships
                .iter()
                .any(|membership| self.team_accesses.contains(&membership.team_id))
    }
}

/// Find the resource control applying to `resource_id`, if any.
pub fn find_by_resource_id<'a>(
    resource_id: &str,
    controls: &'a [ResourceControl],
) -> Option<&'a ResourceControl> {
    controls.iter().find(|rc| rc.resource_id == resource_id)
}
