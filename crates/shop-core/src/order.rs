//! # Order Types
//!
//! The slice of order state the payment flow touches: an order's
//! payment status, flipped to `Received` when the processor confirms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{LookupError, LookupResult};

/// Payment status of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting payment
    Pending,
    /// Processor confirmed the payment
    Received,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

/// An order as seen by the payment flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Unique order ID
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Total in smallest currency unit
    pub total_amount: i64,

    /// Payment status
    #[serde(default)]
    pub payment_status: PaymentStatus,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl OrderRecord {
    /// Create a pending order with a generated ID
    pub fn new(user_id: impl Into<String>, total_amount: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            total_amount,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Received
    }
}

/// Order persistence used by the order routes and the payment webhook
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order
    async fn create(&self, order: OrderRecord) -> LookupResult<OrderRecord>;

    async fn find(&self, order_id: &str) -> LookupResult<OrderRecord>;

    /// All orders owned by a user, oldest first
    async fn find_by_user(&self, user_id: &str) -> LookupResult<Vec<OrderRecord>>;

    /// Mark an order as paid. Idempotent.
    async fn mark_payment_received(&self, order_id: &str) -> LookupResult<OrderRecord>;
}

/// Type alias for a shared order store
pub type BoxedOrderStore = Arc<dyn OrderStore>;

/// In-memory order store
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    orders: RwLock<HashMap<String, OrderRecord>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an order
    pub async fn insert(&self, order: OrderRecord) {
        self.orders.write().await.insert(order.id.clone(), order);
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn create(&self, order: OrderRecord) -> LookupResult<OrderRecord> {
        self.insert(order.clone()).await;
        Ok(order)
    }

    async fn find(&self, order_id: &str) -> LookupResult<OrderRecord> {
        self.orders
            .read()
            .await
            .get(order_id)
            .cloned()
            .ok_or(LookupError::NotFound)
    }

    async fn find_by_user(&self, user_id: &str) -> LookupResult<Vec<OrderRecord>> {
        let mut owned: Vec<OrderRecord> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by_key(|o| o.created_at);
        Ok(owned)
    }

    async fn mark_payment_received(&self, order_id: &str) -> LookupResult<OrderRecord> {
        let mut orders = self.orders.write().await;
        let order = orders.get_mut(order_id).ok_or(LookupError::NotFound)?;
        order.payment_status = PaymentStatus::Received;
        Ok(order.clone())
    }
}
