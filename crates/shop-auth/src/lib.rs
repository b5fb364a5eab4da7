//! # shop-auth
//!
//! Authentication for the storefront backend.
//!
//! This crate provides:
//! - `AuthConfig`: immutable signing secrets and tunables, loaded from the environment
//! - `PasswordVerifier`: PBKDF2-HMAC-SHA256 with constant-time comparison
//! - `TokenSigner` / `TokenVerifier`: HS256 bearer tokens over the sanitized identity
//! - `session`: helpers binding an identity to a `tower-sessions` session
//! - `LocalCredentialFlow`: email/password login issuing a session and a token
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_auth::{AuthConfig, LocalCredentialFlow, TokenVerifier};
//!
//! let config = AuthConfig::from_env()?;
//! let flow = LocalCredentialFlow::new(&config, store.clone());
//!
//! // In the login handler:
//! let issued = flow.login(&session, &email, &password).await?;
//!
//! // On later requests carrying the `jwt` cookie:
//! let verifier = TokenVerifier::new(&config, store);
//! let identity = verifier.verify(token).await?;
//! ```

pub mod config;
pub mod login;
pub mod password;
pub mod session;
pub mod token;

// Re-exports
pub use config::AuthConfig;
pub use login::{IssuedCredentials, LocalCredentialFlow, LoginStage, SessionIssuer};
pub use password::{derive_key, generate_salt, hash_password, PasswordVerifier, PBKDF2_ITERATIONS};
pub use session::{SESSION_COOKIE, SESSION_USER_KEY};
pub use token::{token_from_cookie_header, TokenClaims, TokenSigner, TokenVerifier, TOKEN_COOKIE};
