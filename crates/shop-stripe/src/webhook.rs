//! # Stripe Webhook Handling
//!
//! Signature verification, event parsing and dispatch for Stripe webhooks.
//! The only event acted on is `payment_intent.succeeded`, which marks the
//! order named in the intent's `orderId` metadata as paid.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use shop_core::{
    BoxedOrderStore, LookupError, PaymentError, PaymentEvent, PaymentEventType, PaymentResult,
};
use tracing::{debug, info, warn};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed webhook, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Metadata key carrying our order ID on payment intents
pub const ORDER_ID_METADATA_KEY: &str = "orderId";

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> PaymentResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        PaymentError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(PaymentError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Hex HMAC-SHA256 over `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> PaymentResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Configuration(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check a `Stripe-Signature` header against the payload at time `now`.
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    now: i64,
) -> PaymentResult<()> {
    let sig = parse_signature_header(header)?;

    let within_tolerance = now
        .checked_sub(sig.timestamp)
        .map(i64::unsigned_abs)
        .is_some_and(|age| age <= SIGNATURE_TOLERANCE_SECS.unsigned_abs());

    if !within_tolerance {
        return Err(PaymentError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_signature(secret, sig.timestamp, payload)?;
    let valid = sig
        .signatures
        .iter()
        .any(|candidate| constant_time_compare(candidate, &expected));

    if !valid {
        return Err(PaymentError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

/// Parse a verified webhook body into a [`PaymentEvent`].
pub fn parse_event(payload: &[u8]) -> PaymentResult<PaymentEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload).map_err(|e| {
        PaymentError::WebhookParseError(format!("Failed to parse webhook: {}", e))
    })?;

    debug!("Parsing Stripe webhook: type={}", event.event_type);

    let event_type = match event.event_type.as_str() {
        "payment_intent.succeeded" => PaymentEventType::PaymentSucceeded,
        "payment_intent.payment_failed" => PaymentEventType::PaymentFailed,
        other => PaymentEventType::Unknown(other.to_string()),
    };

    let object = &event.data.object;

    let payment_intent_id = object
        .get("id")
        .and_then(|v| v.as_str())
        .filter(|id| id.starts_with("pi_"))
        .map(String::from);

    let order_id = object
        .get("metadata")
        .and_then(|m| m.get(ORDER_ID_METADATA_KEY))
        .and_then(|v| v.as_str())
        .map(String::from);

    let amount = object.get("amount").and_then(|v| v.as_i64());

    Ok(PaymentEvent {
        event_id: event.id,
        event_type,
        payment_intent_id,
        order_id,
        amount,
        timestamp: DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now),
    })
}

/// Webhook event handler trait
///
/// Implement this trait to handle different webhook events.
#[async_trait]
pub trait PaymentEventHandler: Send + Sync {
    /// Called when a payment intent succeeds
    async fn on_payment_succeeded(&self, event: &PaymentEvent) -> PaymentResult<()> {
        info!("Payment succeeded: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called when a payment intent fails
    async fn on_payment_failed(&self, event: &PaymentEvent) -> PaymentResult<()> {
        warn!("Payment failed: {:?}", event.payment_intent_id);
        Ok(())
    }

    /// Called for unknown/unhandled events
    async fn on_unknown_event(&self, event: &PaymentEvent) -> PaymentResult<()> {
        info!("Unhandled event type {:?}", event.event_type);
        Ok(())
    }
}

/// Marks orders as paid when their payment intent succeeds
pub struct OrderPaymentHandler {
    orders: BoxedOrderStore,
}

impl OrderPaymentHandler {
    pub fn new(orders: BoxedOrderStore) -> Self {
        Self { orders }
    }
}

#[async_trait]
impl PaymentEventHandler for OrderPaymentHandler {
    async fn on_payment_succeeded(&self, event: &PaymentEvent) -> PaymentResult<()> {
        let order_id = event.order_id.as_deref().ok_or_else(|| {
            PaymentError::WebhookParseError(format!(
                "Event {} has no metadata.{}",
                event.event_id, ORDER_ID_METADATA_KEY
            ))
        })?;

        match self.orders.mark_payment_received(order_id).await {
            Ok(order) => {
                info!(
                    "Payment received for order {} ({:?})",
                    order.id, event.payment_intent_id
                );
                Ok(())
            }
            // Acknowledge: redelivery cannot make the order appear
            Err(LookupError::NotFound) => {
                warn!("Payment succeeded for unknown order {}", order_id);
                Ok(())
            }
            Err(LookupError::Unavailable(msg)) => Err(PaymentError::Store(msg)),
        }
    }
}

/// Default no-op handler (just logs events)
pub struct LoggingEventHandler;

impl PaymentEventHandler for LoggingEventHandler {}

/// Dispatch a webhook event to the appropriate handler method
pub async fn dispatch_payment_event(
    handler: &dyn PaymentEventHandler,
    event: &PaymentEvent,
) -> PaymentResult<()> {
    match &event.event_type {
        PaymentEventType::PaymentSucceeded => handler.on_payment_succeeded(event).await,
        PaymentEventType::PaymentFailed => handler.on_payment_failed(event).await,
        PaymentEventType::Unknown(_) => handler.on_unknown_event(event).await,
    }
}
