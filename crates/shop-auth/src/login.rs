//! # Local Credential Flow
//!
//! Email/password login as a linear state machine:
//!
//! ```text
//! Received ──lookup──▶ UserLookedUp ──verify──▶ PasswordVerified ──issue──▶ TokenIssued
//!    │                      │                          │
//!    ├─ not found ──────────┼─▶ InvalidCredentials     │
//!    └─ store error ─▶ LookupFailure                   │
//!                           └─ mismatch ─▶ InvalidCredentials
//! ```
//!
//! Unknown email and wrong password end in the same error after the same
//! amount of key derivation work.

use crate::password::{generate_salt, PasswordVerifier, KEY_LEN};
use crate::session;
use crate::token::TokenSigner;
use crate::AuthConfig;
use serde::Serialize;
use shop_core::{
    sanitize, AuthError, AuthResult, BoxedCredentialStore, LookupError, Role, SanitizedIdentity,
};
use tower_sessions::Session;
use tracing::{debug, error, info, instrument, Span};

/// Stage reached by a login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    Received,
    UserLookedUp,
    PasswordVerified,
    TokenIssued,
}

impl LoginStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginStage::Received => "received",
            LoginStage::UserLookedUp => "user_looked_up",
            LoginStage::PasswordVerified => "password_verified",
            LoginStage::TokenIssued => "token_issued",
        }
    }
}

/// Successful login: the identity plus the bearer token issued for it
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCredentials {
    pub id: String,
    pub role: Role,
    pub token: String,
}

impl IssuedCredentials {
    pub fn identity(&self) -> SanitizedIdentity {
        SanitizedIdentity {
            id: self.id.clone(),
            role: self.role,
        }
    }
}

/// Creates the server-side session and the bearer token for one identity
#[derive(Clone)]
pub struct SessionIssuer {
    signer: TokenSigner,
}

impl SessionIssuer {
    pub fn new(signer: TokenSigner) -> Self {
        Self { signer }
    }

    pub async fn issue(
        &self,
        session: &Session,
        identity: SanitizedIdentity,
    ) -> AuthResult<IssuedCredentials> {
        session::establish(session, &identity).await?;
        let token = self.signer.sign(&identity)?;

        Ok(IssuedCredentials {
            id: identity.id,
            role: identity.role,
            token,
        })
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.signer.ttl_secs()
    }
}

/// Email/password authentication against the credential store
#[derive(Clone)]
pub struct LocalCredentialFlow {
    store: BoxedCredentialStore,
    verifier: PasswordVerifier,
    issuer: SessionIssuer,
    /// Salt and hash derived against when the email is unknown
    decoy: (Vec<u8>, Vec<u8>),
}

impl LocalCredentialFlow {
    pub fn new(config: &AuthConfig, store: BoxedCredentialStore) -> Self {
        Self {
            store,
            verifier: PasswordVerifier::new(config.kdf_iterations, config.kdf_timeout),
            issuer: SessionIssuer::new(TokenSigner::new(config)),
            decoy: (generate_salt(), vec![0u8; KEY_LEN]),
        }
    }

    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    /// Run the full flow, establishing a session and returning a token on success.
    #[instrument(skip_all, fields(stage = LoginStage::Received.as_str()))]
    pub async fn login(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> AuthResult<IssuedCredentials> {
        let user = match self.store.find_by_email(email).await {
            Ok(user) => user,
            Err(LookupError::NotFound) => {
                let (salt, hash) = self.decoy.clone();
                self.verifier
                    .verify_async(password.to_string(), salt, hash)
                    .await?;
                debug!("Login rejected: unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(LookupError::Unavailable(msg)) => {
                error!("Credential lookup failed: {}", msg);
                return Err(AuthError::LookupFailure(msg));
            }
        };
        Span::current().record("stage", LoginStage::UserLookedUp.as_str());

        let matched = self
            .verifier
            .verify_async(
                password.to_string(),
                user.salt().to_vec(),
                user.password_hash().to_vec(),
            )
            .await?;

        if !matched {
            debug!("Login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        Span::current().record("stage", LoginStage::PasswordVerified.as_str());

        let issued = self.issuer.issue(session, sanitize(&user)).await?;
        Span::current().record("stage", LoginStage::TokenIssued.as_str());

        info!("User {} signed in", issued.id);
        Ok(issued)
    }
}
