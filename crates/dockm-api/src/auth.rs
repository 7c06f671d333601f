//! # Request Bouncer
//!
//! Layered authentication and authorization middleware. Every route is
//! mounted behind exactly one of four levels, each a superset of the one
//! before it:
//!
//! | Level           | Guarantee                                              |
//! |-----------------|--------------------------------------------------------|
//! | `public`        | protective response headers only                       |
//! | `authenticated` | verified bearer token, [`Principal`] in extensions     |
//! | `restricted`    | authenticated + [`RequesterContext`] in extensions     |
//! | `administrator` | authenticated + `Role::Administrator`                  |
//!
//! A [`RequesterContext`] is only ever built after authentication succeeds,
//! and it is rebuilt on every request because memberships may change between
//! calls.
//!
//! ## Token Format
//!
//! `Authorization: Bearer <jwt>`, HS256-signed, with claims
//! `{ id, username, role, exp }`. See [`JwtService`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use chrono::{Duration, Utc};
use dockm_core::{
    MembershipRole, Principal, Role, TeamId, TeamMembership, TeamMembershipService, TokenError,
    TokenVerifier, UserId,
};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::AppError;
use crate::middleware::security_headers::secure_headers;

/// Lifetime of issued tokens.
pub const TOKEN_TTL_HOURS: i64 = 8;

// ── Requester Context ───────────────────────────────────────────────────────

/// Per-request snapshot of the caller's admin/leader status and team
/// memberships, used for every authorization decision downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequesterContext {
    /// The caller.
    pub user_id: UserId,
    /// Whether the caller holds the administrator role.
    pub is_admin: bool,
    /// Whether the caller leads at least one team.
    pub is_team_leader: bool,
    /// The caller's team memberships. Empty for administrators.
    pub memberships: Vec<TeamMembership>,
}

impl RequesterContext {
    /// Build the context for `principal` from its memberships.
    pub fn new(principal: &Principal, memberships: Vec<TeamMembership>) -> Self {
        let is_team_leader = memberships
            .iter()
            .any(|m| m.role == MembershipRole::Leader);
        Self {
            user_id: principal.user_id,
            is_admin: principal.is_admin(),
            is_team_leader,
            memberships,
        }
    }

    /// Whether the caller belongs to `team_id`.
    pub fn is_member_of(&self, team_id: TeamId) -> bool {
        self.memberships.iter().any(|m| m.team_id == team_id)
    }

    /// Whether the caller leads `team_id`.
    pub fn is_leader_of(&self, team_id: TeamId) -> bool {
        self.memberships
            .iter()
            .any(|m| m.team_id == team_id && m.role == MembershipRole::Leader)
    }
}

#[async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for RequesterContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequesterContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("no requester context in request".into()))
    }
}

/// Extractor for the verified [`Principal`] injected by the authenticated level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub Principal);

#[async_trait]
impl<S: Send + Sync> axum::extract::FromRequestParts<S> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Authenticated)
            .ok_or_else(|| AppError::Unauthorized("no caller identity in request context".into()))
    }
}

// ── Bouncer ─────────────────────────────────────────────────────────────────

/// Composes the four access levels around axum routers.
///
/// `tokens: None` means authentication is disabled: a synthetic administrator
/// principal is substituted for every request.
#[derive(Clone)]
pub struct RequestBouncer {
    tokens: Option<Arc<dyn TokenVerifier>>,
    memberships: Arc<dyn TeamMembershipService>,
}

impl std::fmt::Debug for RequestBouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBouncer")
            .field("authentication_enabled", &self.authentication_enabled())
            .finish()
    }
}

impl RequestBouncer {
    /// Create a bouncer. Pass `None` for `tokens` to disable authentication.
    pub fn new(
        tokens: Option<Arc<dyn TokenVerifier>>,
        memberships: Arc<dyn TeamMembershipService>,
    ) -> Self {
        Self {
            tokens,
            memberships,
        }
    }

    /// Whether bearer tokens are verified.
    pub fn authentication_enabled(&self) -> bool {
        self.tokens.is_some()
    }

    /// No identity required; adds protective response headers.
    pub fn public<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(from_fn(secure_headers))
    }

    /// Requires a verified bearer token.
    pub fn authenticated<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.public(router.layer(from_fn_with_state(self.clone(), authenticate)))
    }

    /// Authenticated, plus a [`RequesterContext`] for downstream handlers.
    pub fn restricted<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.authenticated(router.layer(from_fn_with_state(self.clone(), restrict)))
    }

    /// Authenticated, plus the administrator role.
    pub fn administrator<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.authenticated(router.layer(from_fn(require_administrator)))
    }

    /// Resolve the principal behind a request's `Authorization` header.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, AppError> {
        let Some(tokens) = &self.tokens else {
            return Ok(synthetic_administrator());
        };

        let raw = match headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
        {
            Some(value) => match value.strip_prefix("Bearer ") {
                Some(token) => token.trim(),
                None => {
                    tracing::warn!("authentication failed: non-Bearer authorization scheme");
                    return Err(AppError::Unauthorized(
                        "authorization header must use Bearer scheme".into(),
                    ));
                }
            },
            None => {
                tracing::warn!("authentication failed: missing authorization header");
                return Err(AppError::Unauthorized(
                    "missing authorization header".into(),
                ));
            }
        };

        if raw.is_empty() {
            tracing::warn!("authentication failed: empty bearer token");
            return Err(AppError::Unauthorized("empty bearer token".into()));
        }

        tokens.verify_token(raw).await.map_err(|err| {
            tracing::warn!(reason = %err, "authentication failed");
            AppError::from(err)
        })
    }

    /// Build the requester context for an authenticated principal.
    pub async fn requester_context(
        &self,
        principal: &Principal,
    ) -> Result<RequesterContext, AppError> {
        if principal.is_admin() {
            return Ok(RequesterContext::new(principal, Vec::new()));
        }
        let memberships = self
            .memberships
            .team_memberships_by_user_id(principal.user_id)
            .await
            .map_err(|e| AppError::Internal(format!("team membership lookup failed: {e}")))?;
        Ok(RequesterContext::new(principal, memberships))
    }
}

fn synthetic_administrator() -> Principal {
    Principal {
        user_id: UserId(0),
        username: "admin".to_string(),
        role: Role::Administrator,
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

async fn authenticate(
    State(bouncer): State<RequestBouncer>,
    mut request: Request,
    next: Next,
) -> Response {
    match bouncer.authenticate(request.headers()).await {
        Ok(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn restrict(
    State(bouncer): State<RequestBouncer>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(principal) = request.extensions().get::<Principal>().cloned() else {
        return AppError::Unauthorized("no caller identity in request context".into())
            .into_response();
    };
    match bouncer.requester_context(&principal).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

async fn require_administrator(request: Request, next: Next) -> Response {
    match request.extensions().get::<Principal>() {
        Some(principal) if principal.is_admin() => next.run(request).await,
        Some(principal) => {
            tracing::warn!(
                user_id = %principal.user_id,
                role = principal.role.as_str(),
                "administrator access denied"
            );
            AppError::Forbidden(format!(
                "role '{}' required, caller has '{}'",
                Role::Administrator.as_str(),
                principal.role.as_str()
            ))
            .into_response()
        }
        None => AppError::Unauthorized("no caller identity in request context".into())
            .into_response(),
    }
}

// ── JWT ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    id: UserId,
    username: String,
    role: Role,
    exp: i64,
}

/// HS256 token issuer and verifier.
///
/// Custom `Debug` redacts the signing secret.
#[derive(Clone)]
pub struct JwtService {
    secret: Arc<Zeroizing<Vec<u8>>>,
    validation: Validation,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Create a service signing with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: Arc::new(Zeroizing::new(secret.to_vec())),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a token for `principal`, valid for [`TOKEN_TTL_HOURS`].
    pub fn issue(&self, principal: &Principal) -> Result<String, TokenError> {
        self.issue_with_ttl(principal, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Issue a token with an explicit lifetime. A negative `ttl` yields an
    /// already-expired token.
    pub fn issue_with_ttl(&self, principal: &Principal, ttl: Duration) -> Result<String, TokenError> {
        let claims = TokenClaims {
            id: principal.user_id,
            username: principal.username.clone(),
            role: principal.role,
            exp: (Utc::now() + ttl).timestamp(),
        };
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[async_trait]
impl TokenVerifier for JwtService {
    async fn verify_token(&self, raw: &str) -> Result<Principal, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(
            raw,
            &DecodingKey::from_secret(&self.secret),
            &self.validation,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;
        Ok(Principal {
            user_id: data.claims.id,
            username: data.claims.username,
            role: data.claims.role,
        })
    }
}
