#![deny(missing_docs)]

//! # dockm-core — Foundational Types for DockM
//!
//! This crate defines the types every other crate in the workspace depends on:
//! identities and roles, team memberships, resource controls, managed
//! endpoints, and the collaborator services the control plane reads from.
//! It has no HTTP dependencies.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** You cannot pass a [`TeamId`] where
//!    a [`UserId`] is expected.
//!
//! 2. **Closed role enums.** [`Role`] and [`MembershipRole`] are tagged
//!    variants, never raw integers, so invalid roles are unrepresentable.
//!
//! 3. **Storage is a collaborator.** The control plane only sees the traits in
//!    [`services`]. [`memory::MemoryStore`] is the in-process implementation
//!    used by the binary and the tests.

pub mod endpoint;
pub mod error;
pub mod identity;
pub mod memory;
pub mod resource;
pub mod services;
pub mod settings;

// Re-export primary types at crate root for ergonomic imports.
pub use endpoint::{EndpointId, ManagedEndpoint, TlsMaterial, TransportTarget};
pub use error::{EndpointError, ServiceError, TokenError};
pub use identity::{MembershipRole, Principal, Role, TeamId, TeamMembership, UserId};
pub use memory::{MemoryStore, Seed, SeedError};
pub use resource::{ResourceControl, ResourceControlId, ResourceType};
pub use services::{
    EndpointService, ResourceControlService, SettingsService, TeamMembershipService,
    TokenVerifier,
};
pub use settings::{LabelPair, Settings};
