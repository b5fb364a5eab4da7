//! # Stripe Payment Intents
//!
//! Implementation of the Stripe Payment Intents API. The client confirms
//! the payment with the returned `client_secret`; completion arrives later
//! as a `payment_intent.succeeded` webhook.

use crate::config::StripeConfig;
use crate::webhook::{parse_event, verify_signature, ORDER_ID_METADATA_KEY};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use shop_core::{PaymentError, PaymentEvent, PaymentIntent, PaymentProcessor, PaymentResult};
use tracing::{debug, error, info, instrument};

/// Stripe Payment Intents processor
pub struct StripePaymentProcessor {
    config: StripeConfig,
    client: Client,
}

impl StripePaymentProcessor {
    /// Create a new Stripe processor
    pub fn new(config: StripeConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }
}

#[async_trait]
impl PaymentProcessor for StripePaymentProcessor {
    #[instrument(skip(self), fields(currency = %self.config.currency))]
    async fn create_payment_intent(
        &self,
        amount: i64,
        order_id: &str,
    ) -> PaymentResult<PaymentIntent> {
        if amount <= 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "Amount must be positive, got {}",
                amount
            )));
        }
        if order_id.is_empty() {
            return Err(PaymentError::InvalidRequest(
                "Order ID is required".to_string(),
            ));
        }

        debug!("Creating Stripe payment intent: amount={}", amount);

        let form_params: Vec<(String, String)> = vec![
            ("amount".to_string(), amount.to_string()),
            ("currency".to_string(), self.config.currency.clone()),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
            (
                format!("metadata[{}]", ORDER_ID_METADATA_KEY),
                order_id.to_string(),
            ),
        ];

        let url = format!("{}/v1/payment_intents", self.config.api_base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .form(&form_params)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(PaymentError::ProviderError {
                    provider: "stripe".to_string(),
                    message: error_response.error.message,
                });
            }

            return Err(PaymentError::ProviderError {
                provider: "stripe".to_string(),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        let intent: StripePaymentIntentResponse = serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!("Failed to parse Stripe response: {}", e))
        })?;

        info!("Created Stripe payment intent: id={}", intent.id);

        Ok(PaymentIntent {
            id: intent.id,
            client_secret: intent.client_secret,
            amount: intent.amount,
            currency: intent.currency,
        })
    }

    #[instrument(skip(self, payload, signature))]
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> PaymentResult<PaymentEvent> {
        verify_signature(
            &self.config.webhook_secret,
            payload,
            signature,
            Utc::now().timestamp(),
        )?;
        parse_event(payload)
    }

    fn provider_name(&self) -> &'static str {
        "stripe"
    }
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntentResponse {
    id: String,
    client_secret: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}
