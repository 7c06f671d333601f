//! # Collaborator Services
//!
//! The control plane never touches storage or token cryptography directly.
//! It consumes these traits; implementations live elsewhere (see
//! [`crate::memory::MemoryStore`] for the in-process one).
//!
//! All methods are async because an implementation may sit behind the
//! network. They are object-safe so the API layer can hold `Arc<dyn _>`.

use async_trait::async_trait;

use crate::endpoint::{EndpointId, ManagedEndpoint};
use crate::error::{ServiceError, TokenError};
use crate::identity::{Principal, TeamId, TeamMembership, UserId};
use crate::resource::{ResourceControl, ResourceControlId};
use crate::settings::Settings;

/// Access to persisted resource-control records.
#[async_trait]
pub trait ResourceControlService: Send + Sync {
    /// Snapshot of every resource control.
    async fn resource_controls(&self) -> Result<Vec<ResourceControl>, ServiceError>;

    /// Fetch one resource control.
    async fn resource_control(
        &self,
        id: ResourceControlId,
    ) -> Result<ResourceControl, ServiceError>;

    /// Persist a new resource control, assigning its identifier.
    ///
    /// Fails with [`ServiceError::AlreadyExists`] when another record already
    /// controls the same resource identifier.
    async fn create_resource_control(
        &self,
        control: ResourceControl,
    ) -> Result<ResourceControl, ServiceError>;

    /// Replace an existing resource control.
    async fn update_resource_control(
        &self,
        id: ResourceControlId,
        control: ResourceControl,
    ) -> Result<ResourceControl, ServiceError>;

    /// Delete a resource control.
    async fn delete_resource_control(&self, id: ResourceControlId) -> Result<(), ServiceError>;
}

/// Read access to team memberships.
#[async_trait]
pub trait TeamMembershipService: Send + Sync {
    /// Memberships held by one user.
    async fn team_memberships_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TeamMembership>, ServiceError>;

    /// Memberships of one team.
    async fn team_memberships_by_team_id(
        &self,
        team_id: TeamId,
    ) -> Result<Vec<TeamMembership>, ServiceError>;
}

/// Read access to global settings.
#[async_trait]
pub trait SettingsService: Send + Sync {
    /// Current settings.
    async fn settings(&self) -> Result<Settings, ServiceError>;
}

/// Access to managed endpoint definitions.
#[async_trait]
pub trait EndpointService: Send + Sync {
    /// Every endpoint, ordered by identifier.
    async fn endpoints(&self) -> Result<Vec<ManagedEndpoint>, ServiceError>;

    /// Fetch one endpoint.
    async fn endpoint(&self, id: EndpointId) -> Result<ManagedEndpoint, ServiceError>;

    /// Replace an existing endpoint definition.
    async fn update_endpoint(&self, endpoint: ManagedEndpoint) -> Result<(), ServiceError>;

    /// Delete an endpoint definition.
    async fn delete_endpoint(&self, id: EndpointId) -> Result<(), ServiceError>;
}

/// Verifies raw bearer credentials.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Check the signature and expiry of `raw` and return the principal it asserts.
    async fn verify_token(&self, raw: &str) -> Result<Principal, TokenError>;
}
