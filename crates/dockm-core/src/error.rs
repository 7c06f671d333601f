//! # Error Hierarchy
//!
//! Structured error types for the collaborator services, built with `thiserror`.
//! Each variant carries enough context for an operator to act on it.

use thiserror::Error;

/// Errors surfaced by the storage collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The requested record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind, e.g. "endpoint".
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A record with the same unique key already exists.
    #[error("{kind} already exists: {key}")]
    AlreadyExists {
        /// Record kind, e.g. "resource control".
        kind: &'static str,
        /// The conflicting unique key.
        key: String,
    },

    /// The backing store could not be reached or failed.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while verifying or issuing a bearer token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is malformed or its signature does not verify.
    #[error("invalid token: {0}")]
    Invalid(String),

    /// The token verified but its expiry has passed.
    #[error("token expired")]
    Expired,

    /// The token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Errors raised while interpreting a managed endpoint's transport settings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The endpoint URL could not be parsed.
    #[error("invalid endpoint URL \"{url}\": {reason}")]
    InvalidUrl {
        /// The raw URL.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The URL scheme is neither `unix` nor `tcp`.
    #[error("unsupported endpoint scheme \"{0}\" (expected unix or tcp)")]
    UnsupportedScheme(String),

    /// A `tcp://` URL without a host.
    #[error("endpoint URL \"{0}\" has no host")]
    MissingHost(String),
}
