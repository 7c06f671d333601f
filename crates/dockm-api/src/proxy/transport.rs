//! # Proxy Transport
//!
//! Executes one classified engine call:
//!
//! - **passthrough** streams the engine response back untouched;
//! - **administrator-only** and **restricted** decide before the engine is
//!   contacted, so a denied mutation never reaches it;
//! - **rewrite** always forwards first, then buffers, decorates, filters or
//!   replaces a successful response. Single-resource reads therefore reach the
//!   engine even when the caller is denied afterwards.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use dockm_core::resource::find_by_resource_id;
use dockm_core::{ResourceControlService, ResourceType, SettingsService};
use http_body_util::BodyExt;

use super::rewrite::{self, access_denied, RewriteContext};
use super::router::{classify, Discipline, Operation};
use super::upstream::{Upstream, UpstreamRequest};
use super::ProxyError;
use crate::auth::RequesterContext;
use crate::policy::authorized_resource_access;

/// The live handler of one managed endpoint.
pub struct Proxy {
    upstream: Arc<dyn Upstream>,
    resource_controls: Arc<dyn ResourceControlService>,
    settings: Arc<dyn SettingsService>,
}

impl std::fmt::Debug for Proxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("upstream", &self.upstream.describe())
            .finish()
    }
}

impl Proxy {
    /// Bind an upstream transport to the services consulted per call.
    pub fn new(
        upstream: Arc<dyn Upstream>,
        resource_controls: Arc<dyn ResourceControlService>,
        settings: Arc<dyn SettingsService>,
    ) -> Self {
        Self {
            upstream,
            resource_controls,
            settings,
        }
    }

    /// The engine this proxy talks to.
    pub fn upstream_description(&self) -> String {
        self.upstream.describe()
    }

    /// Classify `request` and execute it under its discipline.
    pub async fn forward(
        &self,
        requester: &RequesterContext,
        request: UpstreamRequest,
    ) -> Result<Response, ProxyError> {
        let path = request
            .path_and_query
            .split_once('?')
            .map_or(request.path_and_query.as_str(), |(path, _)| path);
        let classification = classify(&request.method, path).map_err(|err| {
            tracing::warn!(
                user_id = %requester.user_id,
                path,
                error = %err,
                "engine call with non-canonical path rejected"
            );
            err
        })?;
        tracing::debug!(
            method = %request.method,
            path,
            discipline = ?classification.discipline,
            "classified engine call"
        );

        match classification.discipline {
            Discipline::Passthrough => self.upstream.send(request).await,
            Discipline::AdministratorOnly => {
                if requester.is_admin {
                    self.upstream.send(request).await
                } else {
                    tracing::warn!(
                        user_id = %requester.user_id,
                        path,
                        "administrator-only engine call denied"
                    );
                    Ok(access_denied())
                }
            }
            Discipline::Restricted(kind) => {
                let resource_id = classification.resource_id.unwrap_or_default();
                self.restricted(requester, kind, &resource_id, request)
                    .await
            }
            Discipline::Rewrite(operation) => self.rewrite(requester, operation, request).await,
        }
    }

    async fn restricted(
        &self,
        requester: &RequesterContext,
        kind: ResourceType,
        resource_id: &str,
        request: UpstreamRequest,
    ) -> Result<Response, ProxyError> {
        if !requester.is_admin {
            let controls = self.resource_controls.resource_controls().await?;
            if let Some(control) = find_by_resource_id(resource_id, &controls) {
                if !authorized_resource_access(control, requester) {
                    tracing::warn!(
                        user_id = %requester.user_id,
                        resource_id,
                        resource_type = ?kind,
                        "engine call on foreign resource denied"
                    );
                    return Ok(access_denied());
                }
            }
        }
        self.upstream.send(request).await
    }

    async fn rewrite(
        &self,
        requester: &RequesterContext,
        operation: Operation,
        request: UpstreamRequest,
    ) -> Result<Response, ProxyError> {
        let response = self.upstream.send(request).await?;
        if !response.status().is_success() {
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| ProxyError::Transport(format!("reading engine response: {e}")))?
            .to_bytes();
        let document = rewrite::parse(&bytes)?;

        let controls = self.resource_controls.resource_controls().await?;
        let label_blacklist = if operation == Operation::ContainerList {
            self.settings.settings().await?.black_listed_labels
        } else {
            Vec::new()
        };
        let ctx = RewriteContext {
            requester,
            resource_controls: &controls,
            label_blacklist: &label_blacklist,
        };

        let rewritten = if operation.is_list() {
            Some(rewrite::rewrite_list(document, operation, &ctx)?)
        } else {
            rewrite::rewrite_inspect(document, operation, &ctx)?
        };

        let Some(document) = rewritten else {
            tracing::warn!(
                user_id = %requester.user_id,
                operation = ?operation,
                "engine response withheld from non-owner"
            );
            return Ok(access_denied());
        };

        tracing::debug!(operation = ?operation, "rewrote engine response");
        parts.status = StatusCode::OK;
        parts.headers.remove(header::CONTENT_LENGTH);
        parts.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(Response::from_parts(parts, Body::from(document.to_string())))
    }
}
