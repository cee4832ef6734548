// src/lib.rs

//! Calliope ledger: the cart and order core of the Calliope storefront.
//!
//! The crate owns the relationship between a user, the product catalog and
//! quantities-in-cart, with product stock as the shared, contended resource:
//!  - At most one cart line per (user, product), always with quantity > 0.
//!  - Adding is additive (insert-or-increment in one statement); updating overwrites.
//!  - Checkout is all-or-nothing: every stock decrement, the order record and
//!    the cart clear commit together, or none do.
//!
//! Storage is reached only through the traits in [`store`]; the handle is
//! passed in explicitly, never held in a global.

pub mod error;
pub mod ledger;
pub mod models;
pub mod store;

// --- Re-exports for the Public API ---

pub use crate::error::{LedgerError, LedgerResult};
pub use crate::ledger::Ledger;
pub use crate::models::{
    Cart, CartEntry, CartLine, CheckoutOutcome, NewProduct, NewUser, Order, OrderItem, Product, ProductPatch, User,
};
pub use crate::store::{CartStore, CatalogStore, MemoryStore, PgStore, SessionStore, Store, UserStore};
