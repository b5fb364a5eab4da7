//! # Application State
//!
//! Shared state for the Axum application.
//! Contains configuration, the credential and order stores, the login flow,
//! the access gate and the optional payment processor.

use crate::gate::{AccessGate, SessionStrategy, TokenStrategy};
use shop_auth::{AuthConfig, LocalCredentialFlow, TokenVerifier};
use shop_core::{
    BoxedCredentialStore, BoxedOrderStore, BoxedPaymentProcessor, MemoryCredentialStore,
    MemoryOrderStore,
};
use shop_stripe::StripePaymentProcessor;
use std::net::SocketAddr;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// TOML file seeding the credential store
    pub users_file: String,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            users_file: std::env::var("USERS_FILE").unwrap_or(defaults.users_file),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| {
                anyhow::anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e)
            })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            environment: "development".to_string(),
            users_file: "config/users.toml".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Secrets, token lifetime and cookie policy
    pub auth: Arc<AuthConfig>,
    /// Credential store (read-only after startup)
    pub credentials: BoxedCredentialStore,
    /// Email/password login
    pub login: LocalCredentialFlow,
    /// Guards protected routes
    pub gate: AccessGate,
    /// Orders awaiting payment confirmation
    pub orders: BoxedOrderStore,
    /// Payment processor, absent when payments are not configured
    pub payments: Option<BoxedPaymentProcessor>,
}

impl AppState {
    /// Build state from the environment, seeding users from `USERS_FILE`
    pub fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let auth = AuthConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load auth config: {}", e))?;

        let credentials = load_credential_store(&config.users_file)?;

        let payments = if std::env::var("STRIPE_SERVER_KEY").is_ok() {
            let stripe = StripePaymentProcessor::from_env()
                .map_err(|e| anyhow::anyhow!("Failed to initialize Stripe: {}", e))?;
            Some(Arc::new(stripe) as BoxedPaymentProcessor)
        } else {
            tracing::warn!("STRIPE_SERVER_KEY not set, payment endpoints disabled");
            None
        };

        Ok(Self::with_parts(
            config,
            auth,
            Arc::new(credentials),
            Arc::new(MemoryOrderStore::new()),
            payments,
        ))
    }

    /// Assemble state from explicit parts
    pub fn with_parts(
        config: AppConfig,
        auth: AuthConfig,
        credentials: BoxedCredentialStore,
        orders: BoxedOrderStore,
        payments: Option<BoxedPaymentProcessor>,
    ) -> Self {
        let login = LocalCredentialFlow::new(&auth, credentials.clone());
        let verifier = TokenVerifier::new(&auth, credentials.clone());
        let gate = AccessGate::new()
            .with_strategy(Arc::new(SessionStrategy))
            .with_strategy(Arc::new(TokenStrategy::new(verifier)));

        Self {
            config,
            auth: Arc::new(auth),
            credentials,
            login,
            gate,
            orders,
            payments,
        }
    }

    /// Name of the configured payment provider, if any
    pub fn payment_provider(&self) -> Option<&'static str> {
        self.payments.as_ref().map(|p| p.provider_name())
    }
}

/// Load seed users from a TOML file
fn load_credential_store(path: &str) -> anyhow::Result<MemoryCredentialStore> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let store = MemoryCredentialStore::from_toml(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path, e))?;
            tracing::info!("Loaded {} users from {}", store.len(), path);
            Ok(store)
        }
        Err(e) => {
            tracing::warn!("No user seed file at {} ({}), starting empty", path, e);
            Ok(MemoryCredentialStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.users_file, "config/users.toml");
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..AppConfig::default()
        };

        assert_eq!(config.socket_addr().unwrap().to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_bad_socket_addr_is_an_error() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };

        assert!(config.socket_addr().is_err());
    }

    #[tokio::test]
    async fn test_seed_file_users_can_sign_in() {
        use shop_auth::PasswordVerifier;
        use shop_core::{CredentialStore, Role};

        let store =
            MemoryCredentialStore::from_toml(include_str!("../../../config/users.toml")).unwrap();
        assert_eq!(store.len(), 2);

        let user = store.find_by_email("a@x.com").await.unwrap();
        assert_eq!(user.role, Role::User);
        assert!(PasswordVerifier::default().verify(
            "password123",
            user.salt(),
            user.password_hash()
        ));
    }

    #[test]
    fn test_missing_seed_file_starts_empty() {
        let store = load_credential_store("does/not/exist.toml").unwrap();
        assert!(store.is_empty());
    }
}
