//! # Payment Processor Trait
//!
//! Seam to the external payment processor. The backend only creates
//! payment intents and consumes signed webhook events.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │         PaymentProcessor (trait)            │
//! │  ├── create_payment_intent()                │
//! │  ├── verify_webhook()                       │
//! │  └── provider_name()                        │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!              ┌────────┴────────┐
//!              │ StripePayment   │
//!              │   Processor     │
//!              └─────────────────┘
//! ```

use crate::error::{PaymentError, PaymentResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A payment intent created by the processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Processor's intent ID
    pub id: String,

    /// Secret the client uses to confirm the payment
    pub client_secret: String,

    /// Amount in smallest currency unit
    pub amount: i64,

    /// ISO 4217 code, lowercase
    pub currency: String,
}

/// Webhook event types we care about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventType {
    /// Payment intent succeeded
    PaymentSucceeded,
    /// Payment intent failed
    PaymentFailed,
    /// Unknown event (passthrough)
    Unknown(String),
}

/// A verified, parsed webhook event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Event ID from provider
    pub event_id: String,

    /// Event type
    pub event_type: PaymentEventType,

    /// Related payment intent ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent_id: Option<String>,

    /// Order ID carried in the intent's metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    /// Amount (in smallest unit)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

/// Core trait for payment processor integrations.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create a payment intent for `amount` (smallest unit) tagged with `order_id`.
    async fn create_payment_intent(
        &self,
        amount: i64,
        order_id: &str,
    ) -> PaymentResult<PaymentIntent>;

    /// Verify a webhook signature and parse the event.
    async fn verify_webhook(&self, payload: &[u8], signature: &str)
        -> PaymentResult<PaymentEvent>;

    /// Get the provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared payment processor (dynamic dispatch)
pub type BoxedPaymentProcessor = Arc<dyn PaymentProcessor>;

/// Convert a decimal total to the smallest currency unit (x100).
pub fn to_smallest_unit(total: f64) -> PaymentResult<i64> {
    if !total.is_finite() || total <= 0.0 {
        return Err(PaymentError::InvalidRequest(format!(
            "Amount must be a positive number, got {}",
            total
        )));
    }
    Ok((total * 100.0).round() as i64)
}
