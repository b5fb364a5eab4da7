//! # Error Types
//!
//! Typed error handling for the storefront backend.
//! Authentication operations return `Result<T, AuthError>`, payment
//! operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Message returned to callers for failed local logins.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Message returned to callers for rejected tokens and sessions.
pub const UNAUTHORIZED: &str = "unauthorized";

/// Message returned to callers for any server-side failure.
pub const INTERNAL_ERROR: &str = "internal error";

/// Core error type for authentication and authorization.
///
/// The `Display` output is for logs only. Anything crossing into a response
/// goes through [`AuthError::public_message`].
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password; callers cannot tell which
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Persistence layer unavailable or errored
    #[error("Credential lookup failed: {0}")]
    LookupFailure(String),

    /// Bad signature, expired, or malformed bearer token
    #[error("Token invalid: {0}")]
    TokenInvalid(String),

    /// Token verified but the identity it names no longer exists
    #[error("Identity not resolvable: {id}")]
    IdentityNotResolvable { id: String },

    /// No session or token was presented
    #[error("No credentials presented")]
    Unauthenticated,

    /// Session store read/write failed
    #[error("Session error: {0}")]
    Session(String),

    /// Key derivation failed or exceeded its time budget
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// Configuration errors (missing secrets, weak keys)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 401,
            AuthError::TokenInvalid(_) => 401,
            AuthError::IdentityNotResolvable { .. } => 401,
            AuthError::Unauthenticated => 401,
            AuthError::LookupFailure(_) => 500,
            AuthError::Session(_) => 500,
            AuthError::KeyDerivation(_) => 500,
            AuthError::Configuration(_) => 500,
            AuthError::Internal(_) => 500,
        }
    }

    /// Generic message safe to return to a client.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => INVALID_CREDENTIALS,
            AuthError::TokenInvalid(_)
            | AuthError::IdentityNotResolvable { .. }
            | AuthError::Unauthenticated => UNAUTHORIZED,
            _ => INTERNAL_ERROR,
        }
    }

    /// Returns true for outcomes caused by what the client presented
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

/// Result type alias for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Error type for the payment processor collaborator
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParseError(String),

    /// Order store unavailable
    #[error("Order store error: {0}")]
    Store(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentError::NetworkError(_) | PaymentError::ProviderError { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::NetworkError(_) => 503,
            PaymentError::WebhookVerificationFailed(_) => 400,
            PaymentError::WebhookParseError(_) => 400,
            PaymentError::Store(_) => 500,
            PaymentError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_share_one_message() {
        assert_eq!(AuthError::InvalidCredentials.public_message(), "invalid credentials");
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
    }

    #[test]
    fn test_token_failures_are_indistinguishable() {
        let invalid = AuthError::TokenInvalid("ExpiredSignature".into());
        let gone = AuthError::IdentityNotResolvable { id: "u1".into() };

        assert_eq!(invalid.public_message(), gone.public_message());
        assert_eq!(invalid.status_code(), gone.status_code());
        assert_eq!(invalid.public_message(), UNAUTHORIZED);
    }

    #[test]
    fn test_lookup_failure_is_internal() {
        let err = AuthError::LookupFailure("connection refused".into());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), INTERNAL_ERROR);
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_payment_status_codes() {
        assert_eq!(PaymentError::InvalidRequest("test".into()).status_code(), 400);
        assert_eq!(
            PaymentError::WebhookVerificationFailed("Signature mismatch".into()).status_code(),
            400
        );
        assert_eq!(PaymentError::Store("down".into()).status_code(), 500);
        assert!(PaymentError::NetworkError("timeout".into()).is_retryable());
        assert!(!PaymentError::WebhookParseError("bad".into()).is_retryable());
    }
}
