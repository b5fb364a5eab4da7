//! # shop-stripe
//!
//! Stripe payment processor for the storefront backend.
//!
//! This crate provides:
//!
//! 1. **StripePaymentProcessor** - Payment Intents API
//!    - Amount in the smallest currency unit
//!    - `orderId` carried in intent metadata
//!    - Returns the `client_secret` for client-side confirmation
//!
//! 2. **Webhook handling** - signed `payment_intent.*` events
//!    - `Stripe-Signature` verification with a 5 minute tolerance
//!    - `OrderPaymentHandler` marks the referenced order as paid
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shop_stripe::StripePaymentProcessor;
//! use shop_core::PaymentProcessor;
//!
//! let processor = StripePaymentProcessor::from_env()?;
//! let intent = processor.create_payment_intent(49900, &order_id).await?;
//!
//! // Hand intent.client_secret to the browser
//! ```
//!
//! ## Webhook Handling
//!
//! ```rust,ignore
//! use shop_stripe::{dispatch_payment_event, OrderPaymentHandler};
//!
//! let handler = OrderPaymentHandler::new(orders.clone());
//!
//! // In your webhook endpoint:
//! let event = processor.verify_webhook(&body, signature).await?;
//! dispatch_payment_event(&handler, &event).await?;
//! ```

pub mod config;
pub mod intent;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use intent::StripePaymentProcessor;
pub use webhook::{
    compute_signature, dispatch_payment_event, verify_signature, LoggingEventHandler,
    OrderPaymentHandler, PaymentEventHandler, SIGNATURE_TOLERANCE_SECS,
};
