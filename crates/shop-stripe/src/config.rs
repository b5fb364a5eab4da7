//! # Stripe Configuration
//!
//! Configuration management for Stripe integration.
//! All secrets are loaded from environment variables.

use shop_core::PaymentError;
use std::env;

/// Stripe API configuration
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub secret_key: String,

    /// Webhook signing secret (whsec_...)
    pub webhook_secret: String,

    /// Currency for payment intents
    pub currency: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// API version
    pub api_version: String,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `STRIPE_SERVER_KEY`
    /// - `ENDPOINT_SECRET`
    ///
    /// Optional: `PAYMENT_CURRENCY` (default `inr`).
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PaymentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("STRIPE_SERVER_KEY").ok_or_else(|| {
            PaymentError::Configuration("STRIPE_SERVER_KEY not set".to_string())
        })?;

        let webhook_secret = lookup("ENDPOINT_SECRET")
            .ok_or_else(|| PaymentError::Configuration("ENDPOINT_SECRET not set".to_string()))?;

        let config = Self::new(secret_key, webhook_secret);
        let config = match lookup("PAYMENT_CURRENCY") {
            Some(currency) => config.with_currency(currency),
            None => config,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(secret_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            webhook_secret: webhook_secret.into(),
            currency: "inr".to_string(),
            api_base_url: "https://api.stripe.com".to_string(),
            api_version: "2024-12-18.acacia".to_string(),
        }
    }

    /// Validate key formats
    pub fn validate(&self) -> Result<(), PaymentError> {
        if !self.secret_key.starts_with("sk_test_") && !self.secret_key.starts_with("sk_live_") {
            return Err(PaymentError::Configuration(
                "STRIPE_SERVER_KEY must start with sk_test_ or sk_live_".to_string(),
            ));
        }

        if !self.webhook_secret.starts_with("whsec_") {
            return Err(PaymentError::Configuration(
                "ENDPOINT_SECRET must start with whsec_".to_string(),
            ));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::Configuration(format!(
                "PAYMENT_CURRENCY must be a 3-letter ISO code, got {}",
                self.currency
            )));
        }

        Ok(())
    }

    /// Check if using test keys
    pub fn is_test_mode(&self) -> bool {
        self.secret_key.starts_with("sk_test_")
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Builder: set currency
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"<redacted>")
            .field("webhook_secret", &"<redacted>")
            .field("currency", &self.currency)
            .field("api_base_url", &self.api_base_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| vars.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_config_validation() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());
        assert_eq!(config.currency, "inr");

        let bad_key = StripeConfig::new("pk_test_abc123", "whsec_secret");
        assert!(bad_key.validate().is_err());

        let bad_secret = StripeConfig::new("sk_live_abc123", "secret");
        assert!(bad_secret.validate().is_err());

        let bad_currency = StripeConfig::new("sk_test_abc123", "whsec_secret").with_currency("rupees");
        assert!(bad_currency.validate().is_err());
    }

    #[test]
    fn test_auth_header() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret");
        assert_eq!(config.auth_header(), "Bearer sk_test_abc123");
    }

    #[test]
    fn test_currency_is_lowercased() {
        let config = StripeConfig::new("sk_test_abc123", "whsec_secret").with_currency("USD");
        assert_eq!(config.currency, "usd");
    }

    #[test]
    fn test_from_lookup_missing_key() {
        let result = StripeConfig::from_lookup(lookup(&[("ENDPOINT_SECRET", "whsec_secret")]));
        assert!(
            matches!(result, Err(PaymentError::Configuration(msg)) if msg.contains("STRIPE_SERVER_KEY"))
        );
    }

    #[test]
    fn test_from_lookup_reads_currency() {
        let config = StripeConfig::from_lookup(lookup(&[
            ("STRIPE_SERVER_KEY", "sk_live_abc123"),
            ("ENDPOINT_SECRET", "whsec_secret"),
            ("PAYMENT_CURRENCY", "EUR"),
        ]))
        .unwrap();

        assert_eq!(config.currency, "eur");
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_from_lookup_validates() {
        let result = StripeConfig::from_lookup(lookup(&[
            ("STRIPE_SERVER_KEY", "sk_test_abc123"),
            ("ENDPOINT_SECRET", "not-a-webhook-secret"),
        ]));
        assert!(result.is_err());
    }
}
