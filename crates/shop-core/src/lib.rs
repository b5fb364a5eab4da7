//! # shop-core
//!
//! Core types and traits for the storefront backend.
//!
//! This crate provides:
//! - `UserRecord`, `Role` and `SanitizedIdentity` with the `sanitize` projection
//! - `CredentialStore` trait and an in-memory implementation
//! - `OrderRecord` and `OrderStore` for payment confirmation
//! - `PaymentProcessor` trait for the external payment processor
//! - `AuthError` and `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use shop_core::{sanitize, CredentialStore, MemoryCredentialStore};
//!
//! let store = MemoryCredentialStore::from_toml(&seed)?;
//! let user = store.find_by_email("a@x.com").await?;
//!
//! // Only the sanitized projection may leave the store
//! let identity = sanitize(&user);
//! ```

pub mod error;
pub mod order;
pub mod payment;
pub mod store;
pub mod user;

// Re-exports for convenience
pub use error::{AuthError, AuthResult, PaymentError, PaymentResult};
pub use order::{BoxedOrderStore, MemoryOrderStore, OrderRecord, OrderStore, PaymentStatus};
pub use payment::{
    to_smallest_unit, BoxedPaymentProcessor, PaymentEvent, PaymentEventType, PaymentIntent,
    PaymentProcessor,
};
pub use store::{
    BoxedCredentialStore, CredentialStore, LookupError, LookupResult, MemoryCredentialStore,
    SeedError,
};
pub use user::{sanitize, Role, SanitizedIdentity, UserRecord};
