//! # Route Classification
//!
//! Every proxied call is matched against [`ROUTE_TABLE`], an ordered list of
//! path patterns; the first matching rule decides the [`Discipline`].
//!
//! Pattern segments:
//!
//! | Segment | Matches                                         |
//! |---------|-------------------------------------------------|
//! | literal | exactly that segment                            |
//! | `{id}`  | any single segment, captured as the resource id |
//! | `*`     | any single segment                              |
//! | `**`    | any remaining segments (trailing only)          |
//!
//! A leading API version segment (`/v1.41/...`) is ignored for matching.
//!
//! Segments are percent-decoded before matching, because the engine routes
//! on the decoded path: `/containers/pr%75ne` is a prune. Dot segments and
//! encoded separators are rejected outright.

use axum::http::Method;
use dockm_core::ResourceType;
use percent_encoding::percent_decode_str;
use thiserror::Error;

/// How a proxied call is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// Forward unmodified.
    Passthrough,
    /// Deny non-administrators before forwarding.
    AdministratorOnly,
    /// Deny non-owners of the captured resource before forwarding.
    Restricted(ResourceType),
    /// Forward, then decorate, filter or deny the response.
    Rewrite(Operation),
}

/// Response rewrites applied by [`Discipline::Rewrite`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Container collection, also filtered by the label blacklist.
    ContainerList,
    /// Single container.
    ContainerInspect,
    /// Service collection.
    ServiceList,
    /// Single service.
    ServiceInspect,
    /// Volume collection.
    VolumeList,
    /// Single volume.
    VolumeInspect,
}

impl Operation {
    /// Kind of resource the operation rewrites.
    pub fn resource_type(self) -> ResourceType {
        match self {
            Self::ContainerList | Self::ContainerInspect => ResourceType::Container,
            Self::ServiceList | Self::ServiceInspect => ResourceType::Service,
            Self::VolumeList | Self::VolumeInspect => ResourceType::Volume,
        }
    }

    /// Whether the response is a collection.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            Self::ContainerList | Self::ServiceList | Self::VolumeList
        )
    }
}

/// Methods a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Methods {
    /// Every method.
    Any,
    /// `GET` only.
    Get,
}

impl Methods {
    fn matches(self, method: &Method) -> bool {
        match self {
            Self::Any => true,
            Self::Get => method == Method::GET,
        }
    }
}

/// One row of the route table.
#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    /// Slash-separated segment pattern.
    pub pattern: &'static str,
    /// Methods the rule applies to.
    pub methods: Methods,
    /// Discipline selected on match.
    pub discipline: Discipline,
}

const fn rule(pattern: &'static str, methods: Methods, discipline: Discipline) -> RouteRule {
    RouteRule {
        pattern,
        methods,
        discipline,
    }
}

use Discipline::{AdministratorOnly, Passthrough, Restricted, Rewrite};

/// Ordered dispatch rules. First match wins; no match means passthrough.
pub static ROUTE_TABLE: &[RouteRule] = &[
    // containers
    rule("/containers/create", Methods::Any, Passthrough),
    rule("/containers/prune", Methods::Any, AdministratorOnly),
    rule("/containers/json", Methods::Any, Rewrite(Operation::ContainerList)),
    rule("/containers/{id}/json", Methods::Any, Rewrite(Operation::ContainerInspect)),
    rule("/containers/{id}/*", Methods::Any, Restricted(ResourceType::Container)),
    rule("/containers/{id}", Methods::Any, Restricted(ResourceType::Container)),
    // services
    rule("/services/create", Methods::Any, Passthrough),
    rule("/services", Methods::Any, Rewrite(Operation::ServiceList)),
    rule("/services/{id}/*", Methods::Any, Restricted(ResourceType::Service)),
    rule("/services/{id}", Methods::Get, Rewrite(Operation::ServiceInspect)),
    rule("/services/{id}", Methods::Any, Restricted(ResourceType::Service)),
    // volumes
    rule("/volumes/create", Methods::Any, Passthrough),
    rule("/volumes/prune", Methods::Any, AdministratorOnly),
    rule("/volumes", Methods::Any, Rewrite(Operation::VolumeList)),
    rule("/volumes/{id}", Methods::Get, Rewrite(Operation::VolumeInspect)),
    rule("/volumes/{id}", Methods::Any, Restricted(ResourceType::Volume)),
    // swarm
    rule("/swarm", Methods::Any, AdministratorOnly),
    rule("/swarm/**", Methods::Any, AdministratorOnly),
];

/// Result of classifying a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Selected discipline.
    pub discipline: Discipline,
    /// Segment captured by `{id}`, if the rule has one.
    pub resource_id: Option<String>,
}

/// An engine path that cannot be classified safely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A segment is not valid percent-encoded UTF-8.
    #[error("engine path segment is not valid UTF-8 after decoding")]
    InvalidEncoding,

    /// A `.` or `..` segment, literal or encoded.
    #[error("dot segments are not allowed in engine paths")]
    DotSegment,

    /// A segment decodes to a path separator.
    #[error("encoded path separators are not allowed in engine paths")]
    EncodedSeparator,
}

/// Classify a call by method and engine-relative path (no query string).
pub fn classify(method: &Method, path: &str) -> Result<Classification, PathError> {
    let decoded = decode_segments(path)?;
    let mut segments: Vec<&str> = decoded.iter().map(String::as_str).collect();
    if segments.first().is_some_and(|s| is_version_segment(s)) {
        segments.remove(0);
    }

    Ok(ROUTE_TABLE
        .iter()
        .filter(|rule| rule.methods.matches(method))
        .find_map(|rule| {
            match_pattern(rule.pattern, &segments).map(|resource_id| Classification {
                discipline: rule.discipline,
                resource_id,
            })
        })
        .unwrap_or(Classification {
            discipline: Discipline::Passthrough,
            resource_id: None,
        }))
}

/// The non-empty segments of `path`, percent-decoded.
fn decode_segments(path: &str) -> Result<Vec<String>, PathError> {
    path.split('/')
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            let segment = percent_decode_str(raw)
                .decode_utf8()
                .map_err(|_| PathError::InvalidEncoding)?;
            if segment.contains(['/', '\\']) {
                return Err(PathError::EncodedSeparator);
            }
            if segment == "." || segment == ".." {
                return Err(PathError::DotSegment);
            }
            Ok(segment.into_owned())
        })
        .collect()
}

/// `v` followed by dot-separated digits, e.g. `v1.41`.
fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| {
            !rest.is_empty()
                && rest
                    .split('.')
                    .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        })
}

/// Match `segments` against `pattern`. `Some(capture)` on match.
fn match_pattern(pattern: &str, segments: &[&str]) -> Option<Option<String>> {
    let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let mut captured = None;

    for (i, part) in parts.iter().enumerate() {
        if *part == "**" {
            return (segments.len() >= i).then_some(captured);
        }
        let segment = segments.get(i)?;
        match *part {
            "{id}" => captured = Some((*segment).to_string()),
            "*" => {}
            literal if literal == *segment => {}
            _ => return None,
        }
    }

    (parts.len() == segments.len()).then_some(captured)
}
