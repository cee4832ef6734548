// calliope_ledger/src/store/mod.rs

//! Storage seams for the ledger.
//!
//! Every trait here is object safe so the server can hold one
//! `Arc<dyn Store>` handle and hand it to each request. The ledger itself
//! only needs [`CartStore`]; the remaining traits back the catalog, the
//! user directory and bearer sessions.
//!
//! Implementations must make each method a single atomic unit of work:
//! `upsert_cart_line` is one insert-or-increment statement, and `checkout`
//! either commits every stock decrement, the order and the cart clear, or
//! nothing at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::models::{CartEntry, CartLine, CheckoutOutcome, NewProduct, NewUser, Order, Product, ProductPatch, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CartStore: Send + Sync {
    /// Creates the (user, product) line or adds `quantity` to it.
    ///
    /// Returns `ProductNotFound` if the product does not exist at write time.
    async fn upsert_cart_line(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> LedgerResult<CartLine>;

    /// Overwrites the quantity of a line owned by `user_id`. `None` if no such line.
    async fn set_cart_line_quantity(&self, user_id: Uuid, line_id: Uuid, quantity: i32)
        -> LedgerResult<Option<CartLine>>;

    /// Returns whether a line owned by `user_id` was deleted.
    async fn delete_cart_line(&self, user_id: Uuid, line_id: Uuid) -> LedgerResult<bool>;

    /// Lines in insertion order, joined with current product data.
    async fn cart_entries(&self, user_id: Uuid) -> LedgerResult<Vec<CartEntry>>;

    async fn checkout(&self, user_id: Uuid) -> LedgerResult<CheckoutOutcome>;

    /// Newest first.
    async fn orders_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Order>>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_products(&self) -> LedgerResult<Vec<Product>>;

    async fn product_by_id(&self, product_id: Uuid) -> LedgerResult<Option<Product>>;

    async fn create_product(&self, new_product: NewProduct) -> LedgerResult<Product>;

    async fn update_product(&self, product_id: Uuid, patch: ProductPatch) -> LedgerResult<Option<Product>>;

    /// Cart lines referencing the product go with it.
    async fn delete_product(&self, product_id: Uuid) -> LedgerResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UsernameTaken` if the handle is in use.
    async fn create_user(&self, new_user: NewUser) -> LedgerResult<User>;

    async fn user_by_username(&self, username: &str) -> LedgerResult<Option<User>>;

    async fn user_by_id(&self, user_id: Uuid) -> LedgerResult<Option<User>>;

    async fn list_users(&self) -> LedgerResult<Vec<User>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> LedgerResult<()>;

    /// The owning user of an unexpired session.
    async fn session_user(&self, token: &str, now: DateTime<Utc>) -> LedgerResult<Option<Uuid>>;

    async fn delete_session(&self, token: &str) -> LedgerResult<()>;
}

/// Everything the storefront needs from one data-store handle.
pub trait Store: CartStore + CatalogStore + UserStore + SessionStore {}

impl<T> Store for T where T: CartStore + CatalogStore + UserStore + SessionStore {}
