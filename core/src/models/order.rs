// calliope_ledger/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_at_purchase_cents: i32,
}

/// Result of a checkout attempt that did not fail.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Stock was decremented, the order persisted and the cart cleared.
    Completed(Order),
    /// The cart had no lines; nothing was committed.
    EmptyCart,
}
