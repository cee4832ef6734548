// tests/checkout_tests.rs
mod common;

use calliope_ledger::{CheckoutOutcome, LedgerError};
use common::*;

#[tokio::test]
async fn test_checkout_decrements_stock_clears_cart_and_records_order() {
    let shop = shop().await;
    let lamp = create_product(shop.store.as_ref(), "Lamp", 2500, 10).await;
    let mug = create_product(shop.store.as_ref(), "Mug", 800, 4).await;
    shop.ledger.add_to_cart(shop.alice.id, lamp.id, 2).await.unwrap();
    shop.ledger.add_to_cart(shop.alice.id, mug.id, 4).await.unwrap();

    let order = match shop.ledger.checkout(shop.alice.id).await.unwrap() {
        CheckoutOutcome::Completed(order) => order,
        CheckoutOutcome::EmptyCart => panic!("Expected a completed checkout"),
    };

    assert_eq!(shop.store.stock_of(lamp.id), Some(8));
    assert_eq!(shop.store.stock_of(mug.id), Some(0));
    assert!(shop.ledger.get_cart(shop.alice.id).await.unwrap().is_empty());
    assert_eq!(order.user_id, shop.alice.id);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.total_cents, 2 * 2500 + 4 * 800);

    let history = shop.ledger.order_history(shop.alice.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, order.id);
    assert!(shop.ledger.order_history(shop.bob.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_is_all_or_nothing() {
    let shop = shop().await;
    let plenty = create_product(shop.store.as_ref(), "Plenty", 1000, 10).await;
    let scarce = create_product(shop.store.as_ref(), "Scarce", 1000, 1).await;
    shop.ledger.add_to_cart(shop.alice.id, plenty.id, 3).await.unwrap();
    shop.ledger.add_to_cart(shop.alice.id, scarce.id, 2).await.unwrap();
    let cart_before = shop.ledger.get_cart(shop.alice.id).await.unwrap();

    let err = shop.ledger.checkout(shop.alice.id).await.unwrap_err();
    match err {
        LedgerError::InsufficientStock {
            product_id,
            requested,
            available,
        } => {
            assert_eq!(product_id, scarce.id);
            assert_eq!(requested, 2);
            assert_eq!(available, 1);
        }
        other => panic!("Expected InsufficientStock, got {:?}", other),
    }

    assert_eq!(shop.store.stock_of(plenty.id), Some(10));
    assert_eq!(shop.store.stock_of(scarce.id), Some(1));
    let cart_after = shop.ledger.get_cart(shop.alice.id).await.unwrap();
    assert_eq!(cart_after.lines, cart_before.lines);
    assert!(shop.ledger.order_history(shop.alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_twice_then_checkout_scenario() {
    let shop = shop().await;
    let a = create_product(shop.store.as_ref(), "A", 999, 5).await;

    shop.ledger.add_to_cart(shop.alice.id, a.id, 3).await.unwrap();
    assert_eq!(shop.ledger.get_cart(shop.alice.id).await.unwrap().quantity_of(a.id), Some(3));
    shop.ledger.add_to_cart(shop.alice.id, a.id, 2).await.unwrap();
    assert_eq!(shop.ledger.get_cart(shop.alice.id).await.unwrap().quantity_of(a.id), Some(5));

    assert!(matches!(
        shop.ledger.checkout(shop.alice.id).await.unwrap(),
        CheckoutOutcome::Completed(_)
    ));
    assert_eq!(shop.store.stock_of(a.id), Some(0));
    assert!(shop.ledger.get_cart(shop.alice.id).await.unwrap().is_empty());

    // A second checkout on the now-empty cart is a committed-nothing no-op.
    assert!(matches!(
        shop.ledger.checkout(shop.alice.id).await.unwrap(),
        CheckoutOutcome::EmptyCart
    ));
    assert_eq!(shop.store.stock_of(a.id), Some(0));
    assert_eq!(shop.ledger.order_history(shop.alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_freezes_price_at_purchase() {
    let shop = shop().await;
    let lamp = create_product(shop.store.as_ref(), "Lamp", 2500, 10).await;
    shop.ledger.add_to_cart(shop.alice.id, lamp.id, 1).await.unwrap();
    let CheckoutOutcome::Completed(order) = shop.ledger.checkout(shop.alice.id).await.unwrap() else {
        panic!("Expected a completed checkout");
    };
    assert_eq!(order.items[0].price_at_purchase_cents, 2500);
    assert_eq!(order.items[0].quantity, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checkouts_for_last_unit() {
    let shop = shop().await;
    let last = create_product(shop.store.as_ref(), "Last one", 5000, 1).await;
    shop.ledger.add_to_cart(shop.alice.id, last.id, 1).await.unwrap();
    shop.ledger.add_to_cart(shop.bob.id, last.id, 1).await.unwrap();

    let (alice_ledger, bob_ledger) = (shop.ledger.clone(), shop.ledger.clone());
    let (alice_id, bob_id) = (shop.alice.id, shop.bob.id);
    let alice = tokio::spawn(async move { alice_ledger.checkout(alice_id).await });
    let bob = tokio::spawn(async move { bob_ledger.checkout(bob_id).await });
    let results = [alice.await.unwrap(), bob.await.unwrap()];

    let succeeded = results.iter().filter(|r| matches!(r, Ok(CheckoutOutcome::Completed(_)))).count();
    let short = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::InsufficientStock { product_id, .. }) if *product_id == last.id))
        .count();
    assert_eq!(succeeded, 1);
    assert_eq!(short, 1);
    assert_eq!(shop.store.stock_of(last.id), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_checkouts_never_oversell() {
    let shop = shop().await;
    let item = create_product(shop.store.as_ref(), "Limited", 100, 7).await;

    let mut shoppers = Vec::new();
    for i in 0..20 {
        let user = create_user(shop.store.as_ref(), &format!("shopper{}", i)).await;
        shop.ledger.add_to_cart(user.id, item.id, 1).await.unwrap();
        shoppers.push(user.id);
    }

    let handles: Vec<_> = shoppers
        .into_iter()
        .map(|user_id| {
            let ledger = shop.ledger.clone();
            tokio::spawn(async move { ledger.checkout(user_id).await })
        })
        .collect();

    let mut succeeded = 0;
    for handle in handles {
        if let Ok(CheckoutOutcome::Completed(_)) = handle.await.unwrap() {
            succeeded += 1;
        }
    }
    assert_eq!(succeeded, 7);
    assert_eq!(shop.store.stock_of(item.id), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_of_same_product_do_not_lose_updates() {
    let shop = shop().await;
    let mug = create_product(shop.store.as_ref(), "Mug", 800, 100).await;

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let ledger = shop.ledger.clone();
            let user_id = shop.alice.id;
            let product_id = mug.id;
            tokio::spawn(async move { ledger.add_to_cart(user_id, product_id, 2).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(shop.store.cart_line_count(shop.alice.id), 1);
    let cart = shop.ledger.get_cart(shop.alice.id).await.unwrap();
    assert_eq!(cart.quantity_of(mug.id), Some(50));
}
