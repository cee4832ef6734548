// calliope_ledger/src/models/cart_line.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One user's quantity of one product, pending checkout.
///
/// At most one line exists per (user, product) and `quantity` is always > 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined with the product's current catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CartEntry {
    pub cart_line_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price_cents: i32,
    pub image_url: Option<String>,
    pub quantity: i32,
}

impl CartEntry {
    pub fn line_total_cents(&self) -> i64 {
        i64::from(self.price_cents) * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub user_id: Uuid,
    pub lines: Vec<CartEntry>,
    pub total_cents: i64,
}

impl Cart {
    pub fn new(user_id: Uuid, lines: Vec<CartEntry>) -> Self {
        let total_cents = lines.iter().map(CartEntry::line_total_cents).sum();
        Self {
            user_id,
            lines,
            total_cents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity held for `product_id`, if the cart has a line for it.
    pub fn quantity_of(&self, product_id: Uuid) -> Option<i32> {
        self
            .lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }
}
