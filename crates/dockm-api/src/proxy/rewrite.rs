//! # Response Rewriting
//!
//! Schema-less JSON utilities for engine responses. Documents stay as
//! [`serde_json::Value`]; only the identifier, the label map and the nested
//! service id are inspected.
//!
//! Rewrites are all-or-nothing: an element that is not an object or lacks its
//! identifier aborts the whole response with a [`ShapeError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dockm_core::resource::find_by_resource_id;
use dockm_core::{LabelPair, ResourceControl, ResourceType};
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::router::Operation;
use crate::auth::RequesterContext;
use crate::error::ErrorBody;
use crate::policy::authorized_resource_access;

/// Key of the ownership metadata attached to decorated objects.
pub const METADATA_KEY: &str = "DockM";

/// Container label carrying the id of the service that owns the container.
pub const SERVICE_ID_LABEL: &str = "com.docker.swarm.service.id";

/// The engine response did not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The body is not valid JSON.
    #[error("response body is not JSON: {0}")]
    NotJson(String),

    /// The document is not of the expected JSON type.
    #[error("expected a JSON {expected}")]
    UnexpectedType {
        /// Expected type, e.g. "array".
        expected: &'static str,
    },

    /// A collection element is not an object.
    #[error("collection element {index} is not an object")]
    ElementNotObject {
        /// Position in the collection.
        index: usize,
    },

    /// An object lacks its string identifier field.
    #[error("missing or non-string identifier field \"{field}\"")]
    MissingIdentifier {
        /// The identifier field, e.g. "Id".
        field: &'static str,
    },
}

/// Per-request inputs to a rewrite.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// The caller.
    pub requester: &'a RequesterContext,
    /// Snapshot of every resource control.
    pub resource_controls: &'a [ResourceControl],
    /// Label pairs hiding containers from list responses.
    pub label_blacklist: &'a [LabelPair],
}

/// Where a resource family keeps the fields the rewriter inspects.
struct Shape {
    id_field: &'static str,
    list_labels: &'static [&'static str],
    inspect_labels: &'static [&'static str],
    /// List responses wrap the array in an object under this key.
    collection: Option<&'static str>,
    /// Ownership also follows the owning service.
    follows_service: bool,
}

fn shape(resource_type: ResourceType) -> Shape {
    match resource_type {
        ResourceType::Container => Shape {
            id_field: "Id",
            list_labels: &["Labels"],
            inspect_labels: &["Config", "Labels"],
            collection: None,
            follows_service: true,
        },
        ResourceType::Service => Shape {
            id_field: "ID",
            list_labels: &["Spec", "Labels"],
            inspect_labels: &["Spec", "Labels"],
            collection: None,
            follows_service: false,
        },
        ResourceType::Volume => Shape {
            id_field: "Name",
            list_labels: &["Labels"],
            inspect_labels: &["Labels"],
            collection: Some("Volumes"),
            follows_service: false,
        },
    }
}

/// Parse an engine response body.
pub fn parse(body: &[u8]) -> Result<Value, ShapeError> {
    serde_json::from_slice(body).map_err(|e| ShapeError::NotJson(e.to_string()))
}

/// Attach `control` as ownership metadata. Decorating again overwrites only
/// the metadata field.
pub fn decorate(object: &mut Map<String, Value>, control: &ResourceControl) {
    object.insert(
        METADATA_KEY.to_string(),
        json!({ "ResourceControl": control }),
    );
}

/// The fixed 403 response replacing any denied call.
pub fn access_denied() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ErrorBody::new("ACCESS_DENIED", "Access denied to resource")),
    )
        .into_response()
}

enum Verdict<'a> {
    Allow(Option<&'a ResourceControl>),
    Deny,
}

fn labels<'v>(object: &'v Map<String, Value>, path: &[&str]) -> Option<&'v Map<String, Value>> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(object.get(*first)?, |value, key| value.get(*key))?
        .as_object()
}

fn evaluate<'a>(
    object: &Map<String, Value>,
    shape: &Shape,
    label_path: &[&str],
    ctx: &RewriteContext<'a>,
) -> Result<Verdict<'a>, ShapeError> {
    let id = object
        .get(shape.id_field)
        .and_then(Value::as_str)
        .ok_or(ShapeError::MissingIdentifier {
            field: shape.id_field,
        })?;

    let primary = find_by_resource_id(id, ctx.resource_controls);
    let secondary = if shape.follows_service {
        labels(object, label_path)
            .and_then(|l| l.get(SERVICE_ID_LABEL))
            .and_then(Value::as_str)
            .and_then(|service_id| find_by_resource_id(service_id, ctx.resource_controls))
    } else {
        None
    };

    let owned = ctx.requester.is_admin
        || [primary, secondary]
            .into_iter()
            .flatten()
            .all(|rc| authorized_resource_access(rc, ctx.requester));
    if !owned {
        return Ok(Verdict::Deny);
    }
    Ok(Verdict::Allow(secondary.or(primary)))
}

fn blacklisted(object: &Map<String, Value>, label_path: &[&str], blacklist: &[LabelPair]) -> bool {
    let Some(labels) = labels(object, label_path) else {
        return false;
    };
    blacklist
        .iter()
        .any(|pair| labels.get(&pair.name).and_then(Value::as_str) == Some(pair.value.as_str()))
}

/// Decorate (administrators) or filter (everyone else) a collection response.
/// Container lists additionally drop blacklisted elements. Order is preserved.
pub fn rewrite_list(
    body: Value,
    operation: Operation,
    ctx: &RewriteContext<'_>,
) -> Result<Value, ShapeError> {
    let shape = shape(operation.resource_type());
    let apply_blacklist = operation == Operation::ContainerList;

    match shape.collection {
        None => {
            let Value::Array(items) = body else {
                return Err(ShapeError::UnexpectedType { expected: "array" });
            };
            Ok(Value::Array(filter_elements(
                items,
                &shape,
                ctx,
                apply_blacklist,
            )?))
        }
        Some(key) => {
            let Value::Object(mut envelope) = body else {
                return Err(ShapeError::UnexpectedType { expected: "object" });
            };
            match envelope.remove(key) {
                Some(Value::Array(items)) => {
                    let kept = filter_elements(items, &shape, ctx, apply_blacklist)?;
                    envelope.insert(key.to_string(), Value::Array(kept));
                }
                Some(Value::Null) => {
                    envelope.insert(key.to_string(), Value::Null);
                }
                None => {}
                Some(_) => return Err(ShapeError::UnexpectedType { expected: "array" }),
            }
            Ok(Value::Object(envelope))
        }
    }
}

fn filter_elements(
    items: Vec<Value>,
    shape: &Shape,
    ctx: &RewriteContext<'_>,
    apply_blacklist: bool,
) -> Result<Vec<Value>, ShapeError> {
    let mut kept = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let Value::Object(mut object) = item else {
            return Err(ShapeError::ElementNotObject { index });
        };
        let control = match evaluate(&object, shape, shape.list_labels, ctx)? {
            Verdict::Deny => continue,
            Verdict::Allow(control) => control,
        };
        if apply_blacklist && blacklisted(&object, shape.list_labels, ctx.label_blacklist) {
            continue;
        }
        if let Some(control) = control {
            decorate(&mut object, control);
        }
        kept.push(Value::Object(object));
    }
    Ok(kept)
}

/// Decorate a single-object response, or `None` when the caller must get the
/// denial instead.
pub fn rewrite_inspect(
    body: Value,
    operation: Operation,
    ctx: &RewriteContext<'_>,
) -> Result<Option<Value>, ShapeError> {
    let shape = shape(operation.resource_type());
    let Value::Object(mut object) = body else {
        return Err(ShapeError::UnexpectedType { expected: "object" });
    };
    match evaluate(&object, &shape, shape.inspect_labels, ctx)? {
        Verdict::Deny => Ok(None),
        Verdict::Allow(control) => {
            if let Some(control) = control {
                decorate(&mut object, control);
            }
            Ok(Some(Value::Object(object)))
        }
    }
}
