//! # In-Memory Store
//!
//! Thread-safe, cloneable implementation of the storage collaborators, seeded
//! from a YAML (or JSON) document at startup.
//!
//! All operations are synchronous under the hood (the locks are `parking_lot`,
//! not `tokio::sync`) because no lock is held across an `.await` point.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointId, ManagedEndpoint};
use crate::error::ServiceError;
use crate::identity::{TeamId, TeamMembership, UserId};
use crate::resource::{ResourceControl, ResourceControlId};
use crate::services::{
    EndpointService, ResourceControlService, SettingsService, TeamMembershipService,
};
use crate::settings::Settings;

/// Initial contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seed {
    /// Managed endpoints.
    pub endpoints: Vec<ManagedEndpoint>,
    /// Team memberships.
    pub team_memberships: Vec<TeamMembership>,
    /// Resource controls.
    pub resource_controls: Vec<ResourceControl>,
    /// Global settings.
    pub settings: Settings,
}

impl Seed {
    /// Parse a seed document. YAML is a superset of JSON, so both are accepted.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    /// Read and parse a seed document from disk.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let seed = Self::from_yaml(&raw).map_err(|source| SeedError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        seed.validate()?;
        Ok(seed)
    }

    /// Check the uniqueness rules the store enforces on every write.
    /// A resource may carry at most one resource control.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut ids = HashSet::new();
        let mut resources = HashSet::new();
        for control in &self.resource_controls {
            if !ids.insert(control.id) {
                return Err(SeedError::DuplicateResourceControlId(control.id));
            }
            if !resources.insert(control.resource_id.as_str()) {
                return Err(SeedError::DuplicateResourceControl {
                    resource_id: control.resource_id.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Errors loading a [`Seed`] from disk.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("cannot read seed {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not a valid seed document.
    #[error("invalid seed {path}: {source}")]
    Parse {
        /// File path.
        path: String,
        /// Underlying parser error.
        source: serde_yaml::Error,
    },
    /// Two resource controls name the same resource.
    #[error("seed has more than one resource control for resource {resource_id}")]
    DuplicateResourceControl {
        /// The contested resource identifier.
        resource_id: String,
    },
    /// Two resource controls share a record identifier.
    #[error("seed reuses resource control id {0}")]
    DuplicateResourceControlId(ResourceControlId),
}

#[derive(Debug, Default)]
struct Tables {
    endpoints: BTreeMap<EndpointId, ManagedEndpoint>,
    team_memberships: Vec<TeamMembership>,
    resource_controls: BTreeMap<ResourceControlId, ResourceControl>,
    settings: Settings,
}

/// In-process implementation of every storage collaborator.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the records of `seed`, after
    /// [`Seed::validate`].
    pub fn from_seed(seed: Seed) -> Result<Self, SeedError> {
        seed.validate()?;
        let tables = Tables {
            endpoints: seed.endpoints.into_iter().map(|e| (e.id, e)).collect(),
            team_memberships: seed.team_memberships,
            resource_controls: seed
                .resource_controls
                .into_iter()
                .map(|rc| (rc.id, rc))
                .collect(),
            settings: seed.settings,
        };
        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Insert or replace an endpoint.
    pub fn put_endpoint(&self, endpoint: ManagedEndpoint) {
        self.tables.write().endpoints.insert(endpoint.id, endpoint);
    }

    /// Add a team membership.
    pub fn put_team_membership(&self, membership: TeamMembership) {
        self.tables.write().team_memberships.push(membership);
    }

    /// Insert or replace a resource control, bypassing the uniqueness check.
    pub fn put_resource_control(&self, control: ResourceControl) {
        self.tables
            .write()
            .resource_controls
            .insert(control.id, control);
    }

    /// Replace the settings.
    pub fn put_settings(&self, settings: Settings) {
        self.tables.write().settings = settings;
    }
}

#[async_trait]
impl ResourceControlService for MemoryStore {
    async fn resource_controls(&self) -> Result<Vec<ResourceControl>, ServiceError> {
        Ok(self.tables.read().resource_controls.values().cloned().collect())
    }

    async fn resource_control(
        &self,
        id: ResourceControlId,
    ) -> Result<ResourceControl, ServiceError> {
        self.tables
            .read()
            .resource_controls
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                kind: "resource control",
                id: id.to_string(),
            })
    }

    async fn create_resource_control(
        &self,
        mut control: ResourceControl,
    ) -> Result<ResourceControl, ServiceError> {
        let mut tables = self.tables.write();
        if tables
            .resource_controls
            .values()
            .any(|rc| rc.resource_id == control.resource_id)
        {
            return Err(ServiceError::AlreadyExists {
                kind: "resource control",
                key: control.resource_id,
            });
        }
        let next = tables
            .resource_controls
            .keys()
            .next_back()
            .map_or(1, |id| id.0 + 1);
        control.id = ResourceControlId(next);
        tables.resource_controls.insert(control.id, control.clone());
        Ok(control)
    }

    async fn update_resource_control(
        &self,
        id: ResourceControlId,
        mut control: ResourceControl,
    ) -> Result<ResourceControl, ServiceError> {
        let mut tables = self.tables.write();
        if !tables.resource_controls.contains_key(&id) {
            return Err(ServiceError::NotFound {
                kind: "resource control",
                id: id.to_string(),
            });
        }
        if tables
            .resource_controls
            .values()
            .any(|rc| rc.id != id && rc.resource_id == control.resource_id)
        {
            return Err(ServiceError::AlreadyExists {
                kind: "resource control",
                key: control.resource_id,
            });
        }
        control.id = id;
        tables.resource_controls.insert(id, control.clone());
        Ok(control)
    }

    async fn delete_resource_control(&self, id: ResourceControlId) -> Result<(), ServiceError> {
        self.tables
            .write()
            .resource_controls
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound {
                kind: "resource control",
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl TeamMembershipService for MemoryStore {
    async fn team_memberships_by_user_id(
        &self,
        user_id: UserId,
    ) -> Result<Vec<TeamMembership>, ServiceError> {
        Ok(self
            .tables
            .read()
            .team_memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn team_memberships_by_team_id(
        &self,
        team_id: TeamId,
    ) -> Result<Vec<TeamMembership>, ServiceError> {
        Ok(self
            .tables
            .read()
            .team_memberships
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SettingsService for MemoryStore {
    async fn settings(&self) -> Result<Settings, ServiceError> {
        Ok(self.tables.read().settings.clone())
    }
}

#[async_trait]
impl EndpointService for MemoryStore {
    async fn endpoints(&self) -> Result<Vec<ManagedEndpoint>, ServiceError> {
        Ok(self.tables.read().endpoints.values().cloned().collect())
    }

    async fn endpoint(&self, id: EndpointId) -> Result<ManagedEndpoint, ServiceError> {
        self.tables
            .read()
            .endpoints
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                kind: "endpoint",
                id: id.to_string(),
            })
    }

    async fn update_endpoint(&self, endpoint: ManagedEndpoint) -> Result<(), ServiceError> {
        let mut tables = self.tables.write();
        match tables.endpoints.get_mut(&endpoint.id) {
            Some(existing) => {
                *existing = endpoint;
                Ok(())
            }
            None => Err(ServiceError::NotFound {
                kind: "endpoint",
                id: endpoint.id.to_string(),
            }),
        }
    }

    async fn delete_endpoint(&self, id: EndpointId) -> Result<(), ServiceError> {
        self.tables
            .write()
            .endpoints
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ServiceError::NotFound {
                kind: "endpoint",
                id: id.to_string(),
            })
    }
}
