// calliope_ledger/src/store/memory.rs

//! In-process store backed by plain collections behind one lock.
//!
//! Every method takes the lock once and never awaits while holding it, so
//! each call is atomic with respect to every other call, matching what the
//! PostgreSQL store gets from its transactions.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CartStore, CatalogStore, SessionStore, UserStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    CartEntry, CartLine, CheckoutOutcome, NewProduct, NewUser, Order, OrderItem, Product, ProductPatch, User,
};

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    products: HashMap<Uuid, Product>,
    // Insertion order doubles as the cart display order.
    cart_lines: Vec<CartLine>,
    orders: Vec<Order>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current stock of a product, for assertions.
    pub fn stock_of(&self, product_id: Uuid) -> Option<i32> {
        self.state.lock().products.get(&product_id).map(|p| p.stock)
    }

    pub fn cart_line_count(&self, user_id: Uuid) -> usize {
        self.state.lock().cart_lines.iter().filter(|l| l.user_id == user_id).count()
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn upsert_cart_line(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> LedgerResult<CartLine> {
        let mut state = self.state.lock();
        if !state.products.contains_key(&product_id) {
            return Err(LedgerError::ProductNotFound(product_id));
        }

        if let Some(line) = state
            .cart_lines
            .iter_mut()
            .find(|l| l.user_id == user_id && l.product_id == product_id)
        {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or(LedgerError::InvalidQuantity(quantity))?;
            return Ok(line.clone());
        }

        let line = CartLine {
            id: Uuid::new_v4(),
            user_id,
            product_id,
            quantity,
            added_at: Utc::now(),
        };
        state.cart_lines.push(line.clone());
        Ok(line)
    }

    async fn set_cart_line_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> LedgerResult<Option<CartLine>> {
        let mut state = self.state.lock();
        Ok(
            state
                .cart_lines
                .iter_mut()
                .find(|l| l.id == line_id && l.user_id == user_id)
                .map(|line| {
                    line.quantity = quantity;
                    line.clone()
                }),
        )
    }

    async fn delete_cart_line(&self, user_id: Uuid, line_id: Uuid) -> LedgerResult<bool> {
        let mut state = self.state.lock();
        let before = state.cart_lines.len();
        state.cart_lines.retain(|l| !(l.id == line_id && l.user_id == user_id));
        Ok(state.cart_lines.len() < before)
    }

    async fn cart_entries(&self, user_id: Uuid) -> LedgerResult<Vec<CartEntry>> {
        let state = self.state.lock();
        Ok(
            state
                .cart_lines
                .iter()
                .filter(|l| l.user_id == user_id)
                .filter_map(|line| {
                    state.products.get(&line.product_id).map(|product| CartEntry {
                        cart_line_id: line.id,
                        product_id: product.id,
                        name: product.name.clone(),
                        price_cents: product.price_cents,
                        image_url: product.image_url.clone(),
                        quantity: line.quantity,
                    })
                })
                .collect(),
        )
    }

    async fn checkout(&self, user_id: Uuid) -> LedgerResult<CheckoutOutcome> {
        let mut state = self.state.lock();
        let lines: Vec<CartLine> = state.cart_lines.iter().filter(|l| l.user_id == user_id).cloned().collect();
        if lines.is_empty() {
            return Ok(CheckoutOutcome::EmptyCart);
        }

        // Check every line before touching anything so a failure commits nothing.
        for line in &lines {
            let available = state
                .products
                .get(&line.product_id)
                .map(|p| p.stock)
                .ok_or(LedgerError::ProductNotFound(line.product_id))?;
            if line.quantity > available {
                warn!(
                    product_id = %line.product_id,
                    requested = line.quantity,
                    available,
                    "memory store: insufficient stock, checkout aborted"
                );
                return Err(LedgerError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available,
                });
            }
        }

        let order_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Some(product) = state.products.get_mut(&line.product_id) {
                product.stock -= line.quantity;
                items.push(OrderItem {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: product.id,
                    quantity: line.quantity,
                    price_at_purchase_cents: product.price_cents,
                });
            }
        }
        state.cart_lines.retain(|l| l.user_id != user_id);

        let order = Order {
            id: order_id,
            user_id,
            total_cents: items
                .iter()
                .map(|i| i64::from(i.price_at_purchase_cents) * i64::from(i.quantity))
                .sum(),
            created_at: Utc::now(),
            items,
        };
        state.orders.push(order.clone());
        debug!(%order_id, %user_id, "memory store: checkout committed");
        Ok(CheckoutOutcome::Completed(order))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Order>> {
        let state = self.state.lock();
        Ok(state.orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        let mut products: Vec<Product> = self.state.lock().products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn product_by_id(&self, product_id: Uuid) -> LedgerResult<Option<Product>> {
        Ok(self.state.lock().products.get(&product_id).cloned())
    }

    async fn create_product(&self, new_product: NewProduct) -> LedgerResult<Product> {
        new_product.validate()?;
        let product = new_product.into_product(Uuid::new_v4(), Utc::now());
        self.state.lock().products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, product_id: Uuid, patch: ProductPatch) -> LedgerResult<Option<Product>> {
        patch.validate()?;
        let mut state = self.state.lock();
        Ok(state.products.get_mut(&product_id).map(|product| {
            patch.apply(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, product_id: Uuid) -> LedgerResult<bool> {
        let mut state = self.state.lock();
        let removed = state.products.remove(&product_id).is_some();
        if removed {
            state.cart_lines.retain(|l| l.product_id != product_id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> LedgerResult<User> {
        let mut state = self.state.lock();
        if state.users.iter().any(|u| u.username == new_user.username) {
            return Err(LedgerError::UsernameTaken(new_user.username));
        }
        let user = new_user.into_user(Uuid::new_v4(), Utc::now());
        state.users.push(user.clone());
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> LedgerResult<Option<User>> {
        Ok(self.state.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_by_id(&self, user_id: Uuid) -> LedgerResult<Option<User>> {
        Ok(self.state.lock().users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn list_users(&self) -> LedgerResult<Vec<User>> {
        Ok(self.state.lock().users.clone())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> LedgerResult<()> {
        self.state.lock().sessions.insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn session_user(&self, token: &str, now: DateTime<Utc>) -> LedgerResult<Option<Uuid>> {
        Ok(
            self
                .state
                .lock()
                .sessions
                .get(token)
                .filter(|(_, expires_at)| *expires_at > now)
                .map(|(user_id, _)| *user_id),
        )
    }

    async fn delete_session(&self, token: &str) -> LedgerResult<()> {
        self.state.lock().sessions.remove(token);
        Ok(())
    }
}
