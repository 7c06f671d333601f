//! # Managed Endpoints
//!
//! A [`ManagedEndpoint`] is a configured container-engine API target. Its URL
//! selects the transport:
//!
//! | URL                          | Transport                          |
//! |------------------------------|------------------------------------|
//! | `unix:///var/run/docker.sock`| [`TransportTarget::Socket`]        |
//! | `tcp://10.0.0.4:2375`        | [`TransportTarget::Tcp`]           |
//! | `tcp://10.0.0.4:2376` + TLS  | [`TransportTarget::TcpTls`]        |

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::EndpointError;
use crate::identity::{TeamId, TeamMembership, UserId};

/// Identifier of a managed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub u32);

impl std::fmt::Display for EndpointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EndpointId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Paths to the PEM artifacts securing a TCP endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TlsMaterial {
    /// CA certificate used to verify the engine.
    #[serde(rename = "TLSCACertPath")]
    pub ca_cert_path: PathBuf,
    /// Client certificate presented to the engine.
    #[serde(rename = "TLSCertPath")]
    pub cert_path: PathBuf,
    /// Private key of the client certificate.
    #[serde(rename = "TLSKeyPath")]
    pub key_path: PathBuf,
}

/// Resolved transport for an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportTarget {
    /// Local socket at the given path.
    Socket {
        /// Socket path.
        path: PathBuf,
    },
    /// Plain TCP; `authority` is `host[:port]`.
    Tcp {
        /// Host and optional port.
        authority: String,
    },
    /// Mutually authenticated TLS over TCP.
    TcpTls {
        /// Host and optional port.
        authority: String,
        /// PEM artifacts to load.
        material: TlsMaterial,
    },
}

/// A configured container-engine API target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagedEndpoint {
    /// Endpoint identifier, also the proxy registry key.
    pub id: EndpointId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// `unix://` or `tcp://` URL of the engine API.
    #[serde(rename = "URL")]
    pub url: String,
    /// TLS material, present when the TCP connection is secured.
    #[serde(default, rename = "TLS")]
    pub tls: Option<TlsMaterial>,
    /// Users allowed to use this endpoint.
    #[serde(default)]
    pub authorized_users: Vec<UserId>,
    /// Teams allowed to use this endpoint.
    #[serde(default)]
    pub authorized_teams: Vec<TeamId>,
}

impl ManagedEndpoint {
    /// Registry key under which this endpoint's proxy is stored.
    pub fn key(&self) -> String {
        self.id.to_string()
    }

    /// Parse the endpoint URL into a transport target.
    pub fn transport(&self) -> Result<TransportTarget, EndpointError> {
        let url = Url::parse(&self.url).map_err(|e| EndpointError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "unix" => Ok(TransportTarget::Socket {
                path: PathBuf::from(url.path()),
            }),
            "tcp" => {
                let host = url
                    .host_str()
                    .ok_or_else(|| EndpointError::MissingHost(self.url.clone()))?;
                let authority = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                Ok(match &self.tls {
                    Some(material) => TransportTarget::TcpTls {
                        authority,
                        material: material.clone(),
                    },
                    None => TransportTarget::Tcp { authority },
                })
            }
            other => Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Whether a non-administrator may use this endpoint, either directly or
    /// through one of their teams.
    pub fn is_authorized(&self, user_id: UserId, memberships: &[TeamMembership]) -> bool {
        self.authorized_users.contains(&user_id)
            || memberships
                .iter()
                .any(|membership| self.authorized_teams.contains(&membership.team_id))
    }
}
