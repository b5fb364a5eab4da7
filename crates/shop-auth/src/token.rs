//! # Bearer Tokens
//!
//! HS256 JWTs over the sanitized identity. Tokens travel in the `jwt`
//! cookie rather than an `Authorization` header.

use crate::config::AuthConfig;
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shop_core::{
    sanitize, AuthError, AuthResult, BoxedCredentialStore, LookupError, Role, SanitizedIdentity,
};
use tracing::{debug, instrument, warn};

/// Name of the cookie carrying the bearer token
pub const TOKEN_COOKIE: &str = "jwt";

/// JWT claims: the sanitized identity plus timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    /// Claims for `identity`, valid for `ttl_secs` from now
    pub fn new(identity: &SanitizedIdentity, ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: identity.id.clone(),
            role: identity.role,
            iat: now,
            exp: now + ttl_secs,
        }
    }

    pub fn identity(&self) -> SanitizedIdentity {
        SanitizedIdentity {
            id: self.id.clone(),
            role: self.role,
        }
    }
}

/// Issues signed bearer tokens
#[derive(Clone)]
pub struct TokenSigner {
    key: EncodingKey,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            key: EncodingKey::from_secret(config.jwt_secret()),
            ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    /// Sign a token for `identity` using the configured lifetime
    pub fn sign(&self, identity: &SanitizedIdentity) -> AuthResult<String> {
        self.sign_claims(&TokenClaims::new(identity, self.ttl_secs))
    }

    /// Sign explicit claims
    pub fn sign_claims(&self, claims: &TokenClaims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.key)
            .map_err(|e| AuthError::Internal(format!("sign JWT: {e}")))
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }
}

/// Validates bearer tokens and resolves them to a current identity
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    store: BoxedCredentialStore,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, store: BoxedCredentialStore) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            key: DecodingKey::from_secret(config.jwt_secret()),
            validation,
            store,
        }
    }

    /// Check signature and expiry only
    pub fn decode(&self, token: &str) -> AuthResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenInvalid("expired".to_string()),
                ErrorKind::InvalidSignature => {
                    AuthError::TokenInvalid("bad signature".to_string())
                }
                _ => AuthError::TokenInvalid(format!("malformed: {e}")),
            })
    }

    /// Validate a token, then re-resolve and re-sanitize the identity it names.
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> AuthResult<SanitizedIdentity> {
        let claims = self.decode(token).map_err(|e| {
            debug!("Rejected bearer token: {}", e);
            e
        })?;

        match self.store.find_by_id(&claims.id).await {
            Ok(user) => Ok(sanitize(&user)),
            Err(LookupError::NotFound) => {
                warn!("Token names unknown user: {}", claims.id);
                Err(AuthError::IdentityNotResolvable { id: claims.id })
            }
            Err(LookupError::Unavailable(msg)) => Err(AuthError::LookupFailure(msg)),
        }
    }
}

/// Pull the bearer token out of a raw `Cookie` header value
pub fn token_from_cookie_header<'a>(cookie_header: &'a str, cookie_name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value)
}
