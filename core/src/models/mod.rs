// calliope_ledger/src/models/mod.rs

//! Data structures shared by the ledger and its stores.

pub mod cart_line;
pub mod order;
pub mod product;
pub mod user;

pub use cart_line::{Cart, CartEntry, CartLine};
pub use order::{CheckoutOutcome, Order, OrderItem};
pub use product::{NewProduct, Product, ProductPatch};
pub use user::{NewUser, User};
