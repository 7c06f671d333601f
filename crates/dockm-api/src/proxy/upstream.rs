//! # Upstream Transports
//!
//! The engine API is reached either over a local socket ([`SocketUpstream`],
//! one HTTP/1 connection per call through `hyper`) or over TCP
//! ([`HttpUpstream`], a pooled `reqwest` client, optionally with mutual TLS).
//!
//! Request bodies are buffered; response bodies stream back untouched so
//! passthrough calls are never held in memory. Dropping the returned future
//! (the inbound connection went away) aborts the outstanding upstream call.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Response};
use bytes::Bytes;
use dockm_core::TlsMaterial;

use super::ProxyError;

/// A call to forward to the engine, with the endpoint prefix already stripped.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    /// HTTP method.
    pub method: Method,
    /// Engine-relative path, including any query string.
    pub path_and_query: String,
    /// Inbound headers. Hop-by-hop headers, `Host` and `Authorization` are dropped.
    pub headers: HeaderMap,
    /// Buffered request body.
    pub body: Bytes,
}

/// A transport to one engine.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Forward `request` and return the engine's response with its body unread.
    async fn send(&self, request: UpstreamRequest) -> Result<Response<Body>, ProxyError>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Headers of an inbound request that may be sent to the engine.
fn forwardable_request_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter(|(name, _)| {
            !is_hop_by_hop(name)
                && *name != header::HOST
                && *name != header::AUTHORIZATION
                && *name != header::CONTENT_LENGTH
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Strip hop-by-hop headers from an engine response.
fn strip_response_headers(headers: &mut HeaderMap) {
    let hop: Vec<HeaderName> = headers.keys().filter(|n| is_hop_by_hop(n)).cloned().collect();
    for name in hop {
        headers.remove(name);
    }
}

// ---------------------------------------------------------------------------
// TCP
// ---------------------------------------------------------------------------

/// Engine reachable over TCP, plain or TLS.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstream {
    /// Plain HTTP to `authority` (`host[:port]`).
    pub fn plain(authority: &str) -> Result<Self, ProxyError> {
        let client = Self::builder()
            .build()
            .map_err(|e| ProxyError::Transport(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: format!("http://{authority}"),
        })
    }

    /// HTTPS to `authority`, verifying the engine against the CA in
    /// `material` and presenting its certificate and key.
    pub async fn tls(authority: &str, material: &TlsMaterial) -> Result<Self, ProxyError> {
        let ca = read_pem(&material.ca_cert_path).await?;
        let mut identity = read_pem(&material.cert_path).await?;
        identity.push(b'\n');
        identity.extend(read_pem(&material.key_path).await?);

        let ca = reqwest::Certificate::from_pem(&ca)
            .map_err(|e| ProxyError::Tls(format!("CA certificate: {e}")))?;
        let identity = reqwest::Identity::from_pem(&identity)
            .map_err(|e| ProxyError::Tls(format!("client certificate/key: {e}")))?;

        let client = Self::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .add_root_certificate(ca)
            .identity(identity)
            .build()
            .map_err(|e| ProxyError::Tls(format!("building TLS client: {e}")))?;
        Ok(Self {
            client,
            base_url: format!("https://{authority}"),
        })
    }

    fn builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
    }
}

async fn read_pem(path: &std::path::Path) -> Result<Vec<u8>, ProxyError> {
    tokio::fs::read(path)
        .await
        .map_err(|e| ProxyError::Tls(format!("reading {}: {e}", path.display())))
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<Response<Body>, ProxyError> {
        let url = format!("{}{}", self.base_url, request.path_and_query);
        let mut outbound = self
            .client
            .request(request.method, &url)
            .headers(forwardable_request_headers(&request.headers));
        if !request.body.is_empty() {
            outbound = outbound.body(request.body);
        }

        let upstream = outbound
            .send()
            .await
            .map_err(|e| ProxyError::Transport(format!("{url}: {e}")))?;

        let status = upstream.status();
        let mut headers = upstream.headers().clone();
        strip_response_headers(&mut headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        Ok(response)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

// ---------------------------------------------------------------------------
// Local socket
// ---------------------------------------------------------------------------

/// Engine reachable over a local socket.
#[cfg(unix)]
#[derive(Debug, Clone)]
pub struct SocketUpstream {
    path: std::path::PathBuf,
}

#[cfg(unix)]
impl SocketUpstream {
    /// Target the socket at `path`. Nothing is opened until the first call.
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[cfg(unix)]
#[async_trait]
impl Upstream for SocketUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<Response<Body>, ProxyError> {
        use http_body_util::Full;
        use hyper_util::rt::TokioIo;

        let stream = tokio::net::UnixStream::connect(&self.path)
            .await
            .map_err(|e| ProxyError::Transport(format!("{}: {e}", self.path.display())))?;
        let (mut sender, connection) =
            hyper::client::conn::http1::handshake::<_, Full<Bytes>>(TokioIo::new(stream))
                .await
                .map_err(|e| ProxyError::Transport(format!("handshake: {e}")))?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::debug!(error = %err, "engine socket connection ended with error");
            }
        });

        let mut outbound = hyper::Request::builder()
            .method(request.method)
            .uri(request.path_and_query.as_str());
        if let Some(headers) = outbound.headers_mut() {
            *headers = forwardable_request_headers(&request.headers);
            headers.insert(header::HOST, HeaderValue::from_static("docker"));
        }
        let outbound = outbound
            .body(Full::new(request.body))
            .map_err(|e| ProxyError::Transport(format!("building request: {e}")))?;

        let response = sender
            .send_request(outbound)
            .await
            .map_err(|e| ProxyError::Transport(format!("{}: {e}", self.path.display())))?;
        let (mut parts, body) = response.into_parts();
        strip_response_headers(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    fn describe(&self) -> String {
        format!("unix://{}", self.path.display())
    }
}
