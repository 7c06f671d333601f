//! # Engine API Proxy Route
//!
//! `ANY /api/endpoints/:id/docker/*path` forwards `/*path` (query string
//! included) to the endpoint's engine through its [`Proxy`](crate::proxy::Proxy).
//!
//! Non-administrators must be authorized on the endpoint, directly or
//! through a team. The proxy is created on first use when bootstrap could not
//! register it.

use axum::body::to_bytes;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, Request, State};
use axum::http::Uri;
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use dockm_core::EndpointId;

use crate::auth::RequesterContext;
use crate::error::AppError;
use crate::extractors::extract_path;
use crate::policy::authorized_endpoint_access;
use crate::proxy::UpstreamRequest;
use crate::state::AppState;

/// Largest request body buffered for forwarding.
pub const MAX_REQUEST_BODY: usize = 256 * 1024 * 1024;

/// Restricted routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/endpoints/:id/docker/*path", any(proxy_request))
}

async fn proxy_request(
    State(state): State<AppState>,
    requester: RequesterContext,
    path: Result<Path<(EndpointId, String)>, PathRejection>,
    request: Request,
) -> Result<Response, AppError> {
    let (endpoint_id, _) = extract_path(path)?;
    let endpoint = state.endpoints.endpoint(endpoint_id).await?;
    if !authorized_endpoint_access(&endpoint, &requester) {
        tracing::warn!(
            user_id = %requester.user_id,
            endpoint_id = %endpoint.id,
            "endpoint access denied"
        );
        return Err(AppError::Forbidden("Access denied to endpoint".into()));
    }

    let proxy = state.proxies.get_or_create_proxy(&endpoint).await?;

    let (parts, body) = request.into_parts();
    let body = to_bytes(body, MAX_REQUEST_BODY)
        .await
        .map_err(|e| AppError::BadRequest(format!("reading request body: {e}")))?;
    let upstream_request = UpstreamRequest {
        method: parts.method,
        path_and_query: engine_path(&parts.uri),
        headers: parts.headers,
        body,
    };

    Ok(proxy.forward(&requester, upstream_request).await?)
}

/// The engine-relative path and query of a proxied URI, taken from the raw
/// URI so percent-encoding survives.
fn engine_path(uri: &Uri) -> String {
    let rest = uri
        .path()
        .splitn(5, '/')
        .nth(4)
        .and_then(|rest| rest.strip_prefix("docker"))
        .unwrap_or("");
    let path = if rest.is_empty() { "/" } else { rest };
    match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}
