// calliope_ledger/src/ledger.rs

//! The cart & order ledger.
//!
//! `Ledger` owns the rules (positive quantities, ownership, no partial
//! checkout) and delegates each state change to a single atomic
//! [`CartStore`] call. Identity is trusted: every operation takes a user id
//! that the caller has already authenticated.
//!
//! Cart views always join the *current* catalog price. A price edit between
//! two `get_cart` calls changes the totals; prices are frozen only when an
//! order is written at checkout.

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Cart, CartLine, CheckoutOutcome, Order};
use crate::store::CartStore;

#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn CartStore>,
}

fn ensure_positive(quantity: i32) -> LedgerResult<()> {
    if quantity <= 0 {
        warn!(quantity, "Rejected non-positive cart quantity.");
        return Err(LedgerError::InvalidQuantity(quantity));
    }
    Ok(())
}

impl Ledger {
    pub fn new(store: Arc<dyn CartStore>) -> Self {
        Self { store }
    }

    /// Adds `quantity` of a product, incrementing an existing line.
    ///
    /// Stock is not reserved here; it is only checked at checkout.
    #[instrument(name = "ledger::add_to_cart", skip(self), err(Display))]
    pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> LedgerResult<CartLine> {
        ensure_positive(quantity)?;
        let line = match self.store.upsert_cart_line(user_id, product_id, quantity).await {
            Err(LedgerError::ProductNotFound(id)) => {
                warn!("Add to cart for unknown product.");
                return Err(LedgerError::ProductNotFound(id));
            }
            other => other?,
        };
        info!(cart_line_id = %line.id, new_quantity = line.quantity, "Cart line added or incremented.");
        Ok(line)
    }

    /// Sets a line's quantity outright. Use [`Ledger::remove_cart_line`] to drop it.
    #[instrument(name = "ledger::update_cart_line", skip(self), err(Display))]
    pub async fn update_cart_line(&self, user_id: Uuid, cart_line_id: Uuid, quantity: i32) -> LedgerResult<CartLine> {
        ensure_positive(quantity)?;
        let line = self
            .store
            .set_cart_line_quantity(user_id, cart_line_id, quantity)
            .await?
            .ok_or(LedgerError::CartLineNotFound(cart_line_id))?;
        info!(new_quantity = line.quantity, "Cart line quantity set.");
        Ok(line)
    }

    #[instrument(name = "ledger::remove_cart_line", skip(self), err(Display))]
    pub async fn remove_cart_line(&self, user_id: Uuid, cart_line_id: Uuid) -> LedgerResult<()> {
        if !self.store.delete_cart_line(user_id, cart_line_id).await? {
            return Err(LedgerError::CartLineNotFound(cart_line_id));
        }
        info!("Cart line removed.");
        Ok(())
    }

    #[instrument(name = "ledger::get_cart", skip(self), err(Display))]
    pub async fn get_cart(&self, user_id: Uuid) -> LedgerResult<Cart> {
        let entries = self.store.cart_entries(user_id).await?;
        Ok(Cart::new(user_id, entries))
    }

    /// Converts the whole cart into stock decrements and an order, atomically.
    ///
    /// On `InsufficientStock` nothing changes: stock and cart are exactly as
    /// before the call. An empty cart yields [`CheckoutOutcome::EmptyCart`].
    #[instrument(name = "ledger::checkout", skip(self), err(Display))]
    pub async fn checkout(&self, user_id: Uuid) -> LedgerResult<CheckoutOutcome> {
        let outcome = self.store.checkout(user_id).await?;
        match &outcome {
            CheckoutOutcome::Completed(order) => {
                info!(order_id = %order.id, total_cents = order.total_cents, "Checkout completed.")
            }
            CheckoutOutcome::EmptyCart => info!("Checkout on empty cart; nothing committed."),
        }
        Ok(outcome)
    }

    #[instrument(name = "ledger::order_history", skip(self), err(Display))]
    pub async fn order_history(&self, user_id: Uuid) -> LedgerResult<Vec<Order>> {
        self.store.orders_for_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;
    use crate::store::{CatalogStore, MemoryStore};

    async fn ledger_with_product(stock: i32) -> (Ledger, Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let product = store
            .create_product(NewProduct {
                name: "Lamp".to_string(),
                description: "Desk lamp".to_string(),
                price_cents: 2500,
                image_url: None,
                stock,
            })
            .await
            .unwrap();
        (Ledger::new(store.clone()), store, product.id)
    }

    #[tokio::test]
    async fn zero_and_negative_quantities_are_rejected_before_the_store() {
        let (ledger, store, product_id) = ledger_with_product(3).await;
        let user = Uuid::new_v4();
        for bad in [0, -4] {
            let err = ledger.add_to_cart(user, product_id, bad).await.unwrap_err();
            assert!(matches!(err, LedgerError::InvalidQuantity(q) if q == bad));
        }
        assert_eq!(store.cart_line_count(user), 0);
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (ledger, store, _) = ledger_with_product(3).await;
        let missing = Uuid::new_v4();
        let user = Uuid::new_v4();
        let err = ledger.add_to_cart(user, missing, 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::ProductNotFound(id) if id == missing));
        assert_eq!(store.cart_line_count(user), 0);
    }

    #[tokio::test]
    async fn increment_overflow_is_a_quantity_error() {
        let (ledger, _store, product_id) = ledger_with_product(3).await;
        let user = Uuid::new_v4();
        ledger.add_to_cart(user, product_id, i32::MAX).await.unwrap();
        let err = ledger.add_to_cart(user, product_id, 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidQuantity(1)));
        let cart = ledger.get_cart(user).await.unwrap();
        assert_eq!(cart.quantity_of(product_id), Some(i32::MAX));
    }
}
