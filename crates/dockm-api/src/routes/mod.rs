//! # API Route Modules
//!
//! - `docker` — engine API proxy under `/api/endpoints/:id/docker/*`.
//! - `endpoints` — listing (restricted) and update/delete (administrator).
//! - `resource_controls` — create/update/delete ownership records.
//! - `teams` — team and user membership views.
//! - `status` — public status and settings.
//!
//! Each module only builds routers; `crate::app` mounts them behind the
//! access level they require.

pub mod docker;
pub mod endpoints;
pub mod resource_controls;
pub mod status;
pub mod teams;
