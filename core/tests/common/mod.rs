// tests/common/mod.rs
#![allow(dead_code)] // Each test binary uses a different subset of these helpers

use std::sync::Arc;

use calliope_ledger::{CatalogStore, Ledger, MemoryStore, NewProduct, NewUser, Product, User, UserStore};
use once_cell::sync::Lazy;
use tracing::Level;

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer() // Important for tests to capture output
        .try_init()
        .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
    Lazy::force(&TRACING_INIT);
}

// --- Fixtures ---
pub fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".to_string(),
        is_admin: false,
        name: format!("{} Tester", username),
        email_address: format!("{}@example.com", username),
        phone: None,
        shipping_address: "1 Test Street".to_string(),
        mailing_address: "1 Test Street".to_string(),
    }
}

pub fn new_product(name: &str, price_cents: i32, stock: i32) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{} description", name),
        price_cents,
        image_url: Some(format!("https://img.example.com/{}.png", name.to_lowercase().replace(' ', "-"))),
        stock,
    }
}

pub async fn create_user<S: UserStore + ?Sized>(store: &S, username: &str) -> User {
    store.create_user(new_user(username)).await.expect("user fixture")
}

pub async fn create_product<S: CatalogStore + ?Sized>(store: &S, name: &str, price_cents: i32, stock: i32) -> Product {
    store
        .create_product(new_product(name, price_cents, stock))
        .await
        .expect("product fixture")
}

/// A memory store with two shoppers and a ledger over it.
pub struct Shop {
    pub store: Arc<MemoryStore>,
    pub ledger: Ledger,
    pub alice: User,
    pub bob: User,
}

pub async fn shop() -> Shop {
    setup_tracing();
    let store = Arc::new(MemoryStore::new());
    let alice = create_user(store.as_ref(), "alice").await;
    let bob = create_user(store.as_ref(), "bob").await;
    Shop {
        ledger: Ledger::new(store.clone()),
        store,
        alice,
        bob,
    }
}
