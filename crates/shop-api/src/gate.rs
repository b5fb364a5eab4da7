//! # Access Gate
//!
//! Guards protected routes. Each [`AuthStrategy`] inspects the request and
//! either yields a sanitized identity or passes. The gate tries them in
//! order and the first identity wins. If none yields one, the request is
//! rejected with 401 before the handler runs.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │           AuthStrategy (trait)              │
//! │  ├── authenticate(&Parts)                   │
//! │  └── name()                                 │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!         ┌─────────────┴─────────────┐
//!         │                           │
//! ┌───────┴───────┐           ┌───────┴───────┐
//! │SessionStrategy│           │ TokenStrategy │
//! │  (shop.sid)   │           │    (jwt)      │
//! └───────────────┘           └───────────────┘
//! ```

use crate::handlers::{auth_error_to_response, ErrorResponse};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header::COOKIE, request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use shop_auth::{session, token_from_cookie_header, TokenVerifier, TOKEN_COOKIE};
use shop_core::{AuthError, AuthResult, SanitizedIdentity};
use std::sync::Arc;
use tower_sessions::Session;
use tracing::debug;

/// One way of establishing who is calling.
///
/// `Ok(None)` means "no identity from this strategy", `Err` means the
/// strategy could not decide (infrastructure failure).
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Strategy name (for logging)
    fn name(&self) -> &'static str;

    /// Inspect the request head
    async fn authenticate(&self, parts: &Parts) -> AuthResult<Option<SanitizedIdentity>>;
}

/// Identity stored in the server-side session
pub struct SessionStrategy;

#[async_trait]
impl AuthStrategy for SessionStrategy {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn authenticate(&self, parts: &Parts) -> AuthResult<Option<SanitizedIdentity>> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AuthError::Internal("session layer not installed".to_string()))?;

        session::current_identity(session).await
    }
}

/// Bearer token carried in the `jwt` cookie
pub struct TokenStrategy {
    verifier: TokenVerifier,
}

impl TokenStrategy {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }
}

#[async_trait]
impl AuthStrategy for TokenStrategy {
    fn name(&self) -> &'static str {
        "token"
    }

    async fn authenticate(&self, parts: &Parts) -> AuthResult<Option<SanitizedIdentity>> {
        let token = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|header| token_from_cookie_header(header, TOKEN_COOKIE));

        let Some(token) = token else {
            return Ok(None);
        };

        match self.verifier.verify(token).await {
            Ok(identity) => Ok(Some(identity)),
            Err(e) if e.is_client_error() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Ordered set of strategies, first success wins
#[derive(Clone, Default)]
pub struct AccessGate {
    strategies: Vec<Arc<dyn AuthStrategy>>,
}

impl AccessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy (evaluated after those already registered)
    pub fn with_strategy(mut self, strategy: Arc<dyn AuthStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Registered strategy names, in evaluation order
    pub fn strategies(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Resolve the caller or fail with [`AuthError::Unauthenticated`]
    pub async fn authenticate(&self, parts: &Parts) -> AuthResult<SanitizedIdentity> {
        for strategy in &self.strategies {
            if let Some(identity) = strategy.authenticate(parts).await? {
                debug!("Authenticated {} via {}", identity.id, strategy.name());
                return Ok(identity);
            }
        }
        Err(AuthError::Unauthenticated)
    }
}

/// Middleware for protected routes.
///
/// On success the [`SanitizedIdentity`] is attached to the request
/// extensions for handlers to extract.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let (mut parts, body) = request.into_parts();

    let identity = state
        .gate
        .authenticate(&parts)
        .await
        .map_err(auth_error_to_response)?;

    parts.extensions.insert(identity);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
