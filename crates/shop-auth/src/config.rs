//! # Auth Configuration
//!
//! Signing secrets and auth tunables, loaded once at startup and
//! passed by reference into the token and session components.

use crate::password::PBKDF2_ITERATIONS;
use sha2::{Digest, Sha512};
use shop_core::AuthError;
use std::env;
use std::time::Duration;

/// Minimum accepted length for signing secrets, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Default bearer token lifetime
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Default upper bound on one password key derivation
pub const DEFAULT_KDF_TIMEOUT_MS: u64 = 5000;

/// Immutable auth configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens (`JWT_SECRET_KEY`)
    jwt_secret: String,

    /// Signing secret for session cookies (`SESSION_KEY`)
    session_secret: String,

    /// Bearer token lifetime
    pub token_ttl: Duration,

    /// Upper bound on one password key derivation
    pub kdf_timeout: Duration,

    /// PBKDF2 iteration count
    pub kdf_iterations: u32,

    /// Mark cookies `Secure`
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `JWT_SECRET_KEY`
    /// - `SESSION_KEY`
    ///
    /// Optional: `JWT_TTL_SECS`, `KDF_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET_KEY")
            .ok_or_else(|| AuthError::Configuration("JWT_SECRET_KEY not set".to_string()))?;

        let session_secret = lookup("SESSION_KEY")
            .ok_or_else(|| AuthError::Configuration("SESSION_KEY not set".to_string()))?;

        let token_ttl = lookup("JWT_TTL_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TOKEN_TTL_SECS);

        let kdf_timeout = lookup("KDF_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_KDF_TIMEOUT_MS);

        let secure_cookies = lookup("ENVIRONMENT")
            .map(|e| e == "production")
            .unwrap_or(false);

        let config = Self::new(jwt_secret, session_secret)
            .with_token_ttl(Duration::from_secs(token_ttl))
            .with_kdf_timeout(Duration::from_millis(kdf_timeout))
            .with_secure_cookies(secure_cookies);

        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit secrets (for testing)
    pub fn new(jwt_secret: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            session_secret: session_secret.into(),
            token_ttl: Duration::from_secs(DEFAULT_TOKEN_TTL_SECS),
            kdf_timeout: Duration::from_millis(DEFAULT_KDF_TIMEOUT_MS),
            kdf_iterations: PBKDF2_ITERATIONS,
            secure_cookies: false,
        }
    }

    /// Reject secrets too short to be high-entropy
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "JWT_SECRET_KEY must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.session_secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Configuration(format!(
                "SESSION_KEY must be at least {} bytes",
                MIN_SECRET_LEN
            )));
        }

        if self.jwt_secret == self.session_secret {
            return Err(AuthError::Configuration(
                "JWT_SECRET_KEY and SESSION_KEY must differ".to_string(),
            ));
        }

        if self.token_ttl.is_zero() {
            return Err(AuthError::Configuration(
                "JWT_TTL_SECS must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// 64 bytes of session cookie key material stretched from `SESSION_KEY`.
    pub fn session_key_material(&self) -> [u8; 64] {
        let digest = Sha512::digest(self.session_secret.as_bytes());
        let mut out = [0u8; 64];
        out.copy_from_slice(&digest);
        out
    }

    /// Builder: set token lifetime
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Builder: set key derivation timeout
    pub fn with_kdf_timeout(mut self, timeout: Duration) -> Self {
        self.kdf_timeout = timeout;
        self
    }

    /// Builder: override the PBKDF2 iteration count (tests only)
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.kdf_iterations = iterations;
        self
    }

    /// Builder: mark cookies `Secure`
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("kdf_timeout", &self.kdf_timeout)
            .field("kdf_iterations", &self.kdf_iterations)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}
