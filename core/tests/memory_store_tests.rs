// tests/memory_store_tests.rs
mod common;

use calliope_ledger::{CatalogStore, LedgerError, MemoryStore, ProductPatch, SessionStore, UserStore};
use chrono::{Duration, Utc};
use common::*;
use uuid::Uuid;

#[tokio::test]
async fn test_usernames_are_unique() {
    setup_tracing();
    let store = MemoryStore::new();
    create_user(&store, "alice").await;
    let err = store.create_user(new_user("alice")).await.unwrap_err();
    assert!(matches!(err, LedgerError::UsernameTaken(name) if name == "alice"));
    assert_eq!(store.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sessions_expire() {
    setup_tracing();
    let store = MemoryStore::new();
    let user = create_user(&store, "alice").await;
    let now = Utc::now();
    store.create_session("live", user.id, now + Duration::hours(1)).await.unwrap();
    store.create_session("stale", user.id, now - Duration::seconds(1)).await.unwrap();

    assert_eq!(store.session_user("live", now).await.unwrap(), Some(user.id));
    assert_eq!(store.session_user("stale", now).await.unwrap(), None);
    assert_eq!(store.session_user("unknown", now).await.unwrap(), None);

    store.delete_session("live").await.unwrap();
    assert_eq!(store.session_user("live", now).await.unwrap(), None);
}

#[tokio::test]
async fn test_catalog_crud_validates_input() {
    setup_tracing();
    let store = MemoryStore::new();
    let err = store.create_product(new_product("Free", 0, 1)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let lamp = create_product(&store, "Lamp", 2500, 3).await;
    let bad_patch = ProductPatch {
        stock: Some(-2),
        ..Default::default()
    };
    assert!(store.update_product(lamp.id, bad_patch).await.is_err());
    assert_eq!(store.stock_of(lamp.id), Some(3));

    let restock = ProductPatch {
        stock: Some(12),
        ..Default::default()
    };
    assert_eq!(store.update_product(lamp.id, restock).await.unwrap().unwrap().stock, 12);
    assert!(store.update_product(Uuid::new_v4(), ProductPatch::default()).await.unwrap().is_none());

    assert!(store.delete_product(lamp.id).await.unwrap());
    assert!(!store.delete_product(lamp.id).await.unwrap());
    assert!(store.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_products_are_listed_by_name() {
    setup_tracing();
    let store = MemoryStore::new();
    create_product(&store, "Mug", 800, 1).await;
    create_product(&store, "Apron", 1800, 1).await;
    create_product(&store, "Lamp", 2500, 1).await;
    let names: Vec<String> = store.list_products().await.unwrap().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Apron", "Lamp", "Mug"]);
}
