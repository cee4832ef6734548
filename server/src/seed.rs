// calliope_server/src/seed.rs

//! Demo data: an admin, ten shoppers, a fixed catalog, and one cart walked
//! through add, update and remove. Running twice is a no-op.

use calliope_ledger::{Cart, CatalogStore, NewProduct, NewUser, UserStore};
use tracing::{info, instrument};

use crate::errors::Result;
use crate::services::auth_service::hash_password_blocking;
use crate::state::AppState;

const ADMIN_USERNAME: &str = "admin";
const DEMO_PASSWORD: &str = "test123";

const SHOPPERS: [(&str, &str); 10] = [
  ("ada_l", "Ada Lovelace"),
  ("grace_h", "Grace Hopper"),
  ("alan_t", "Alan Turing"),
  ("edsger_d", "Edsger Dijkstra"),
  ("barbara_l", "Barbara Liskov"),
  ("ken_t", "Ken Thompson"),
  ("margaret_h", "Margaret Hamilton"),
  ("dennis_r", "Dennis Ritchie"),
  ("frances_a", "Frances Allen"),
  ("donald_k", "Donald Knuth"),
];

const ADJECTIVES: [&str; 5] = ["Rustic", "Sleek", "Handmade", "Ergonomic", "Refined"];
const NOUNS: [&str; 10] = [
  "Chair", "Lamp", "Table", "Mug", "Backpack", "Notebook", "Kettle", "Blanket", "Clock", "Speaker",
];

fn demo_user(username: &str, name: &str, password_hash: &str, is_admin: bool, index: usize) -> NewUser {
  NewUser {
    username: username.to_string(),
    password_hash: password_hash.to_string(),
    is_admin,
    name: name.to_string(),
    email_address: format!("{}@calliope.test", username),
    phone: Some(format!("555{:07}", index)),
    shipping_address: format!("{} Test Street", 100 + index),
    mailing_address: format!("{} Test Street", 100 + index),
  }
}

/// Fifty products, every adjective paired with every noun. Price and stock
/// are derived from the position so reruns on a fresh database agree.
fn demo_catalog() -> Vec<NewProduct> {
  let mut products = Vec::with_capacity(ADJECTIVES.len() * NOUNS.len());
  for (a, adjective) in ADJECTIVES.iter().enumerate() {
    for (n, noun) in NOUNS.iter().enumerate() {
      let i = (a * NOUNS.len() + n) as i32;
      let slug = format!("{}-{}", adjective, noun).to_lowercase();
      products.push(NewProduct {
        name: format!("{} {}", adjective, noun),
        description: format!("A {} {} for everyday use.", adjective.to_lowercase(), noun.to_lowercase()),
        price_cents: 100 + (i * 4_937) % 24_900,
        image_url: Some(format!("https://images.calliope.test/{}.png", slug)),
        stock: 1 + (i * 7) % 20,
      });
    }
  }
  products
}

fn log_cart(stage: &str, cart: &Cart) {
  for entry in &cart.lines {
    info!(
      stage,
      product = %entry.name,
      price_cents = entry.price_cents,
      quantity = entry.quantity,
      cart_line_id = %entry.cart_line_id,
      "Demo cart line."
    );
  }
  info!(stage, lines = cart.lines.len(), total_cents = cart.total_cents, "Demo cart total.");
}

#[instrument(name = "seed::run", skip(state), err(Display))]
pub async fn run(state: &AppState) -> Result<()> {
  if state.store.user_by_username(ADMIN_USERNAME).await?.is_some() {
    info!("Seed data already present; skipping.");
    return Ok(());
  }

  // Every demo account shares one password, so one hash serves them all.
  let password_hash = hash_password_blocking(DEMO_PASSWORD.to_string()).await?;
  state
    .store
    .create_user(demo_user(ADMIN_USERNAME, "Elvis Esp", &password_hash, true, 0))
    .await?;
  let mut shoppers = Vec::with_capacity(SHOPPERS.len());
  for (i, (username, name)) in SHOPPERS.iter().enumerate() {
    let user = demo_user(username, name, &password_hash, false, i + 1);
    shoppers.push(state.store.create_user(user).await?);
  }
  info!(count = shoppers.len() + 1, "Users seeded.");

  let mut products = Vec::new();
  for new_product in demo_catalog() {
    products.push(state.store.create_product(new_product).await?);
  }
  info!(count = products.len(), "Products seeded.");

  let (Some(shopper), [first, second, ..]) = (shoppers.first(), products.as_slice()) else {
    return Ok(());
  };
  let ledger = &state.ledger;
  let first_line = ledger.add_to_cart(shopper.id, first.id, 2).await?;
  ledger.add_to_cart(shopper.id, second.id, 3).await?;
  log_cart("after_add", &ledger.get_cart(shopper.id).await?);

  ledger.update_cart_line(shopper.id, first_line.id, 5).await?;
  log_cart("after_update", &ledger.get_cart(shopper.id).await?);

  ledger.remove_cart_line(shopper.id, first_line.id).await?;
  log_cart("after_remove", &ledger.get_cart(shopper.id).await?);

  info!("Database seeding complete.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;
  use std::sync::Arc;

  use calliope_ledger::MemoryStore;

  use crate::config::AppConfig;
  use crate::services::auth_service::verify_password;

  #[test]
  fn catalog_is_valid_and_unique() {
    let catalog = demo_catalog();
    assert_eq!(catalog.len(), 50);
    let names: HashSet<_> = catalog.iter().map(|p| p.name.clone()).collect();
    assert_eq!(names.len(), catalog.len());
    for product in &catalog {
      assert!(product.validate().is_ok(), "{}", product.name);
      assert!((1..=20).contains(&product.stock));
      assert!(product.price_cents >= 100 && product.price_cents < 25_000);
    }
  }

  #[actix_web::test]
  async fn run_seeds_once_with_a_usable_demo_password() {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(config));

    run(&state).await.unwrap();
    let users = state.store.list_users().await.unwrap();
    assert_eq!(users.len(), SHOPPERS.len() + 1);
    assert_eq!(state.store.list_products().await.unwrap().len(), 50);

    let admin = state.store.user_by_username(ADMIN_USERNAME).await.unwrap().unwrap();
    assert!(admin.is_admin);
    assert!(verify_password(&admin.password_hash, DEMO_PASSWORD).unwrap());
    let shopper = state.store.user_by_username(SHOPPERS[0].0).await.unwrap().unwrap();
    assert!(verify_password(&shopper.password_hash, DEMO_PASSWORD).unwrap());

    // The walk-through leaves only the second product, at quantity 3.
    let cart = state.ledger.get_cart(shopper.id).await.unwrap();
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].quantity, 3);

    run(&state).await.unwrap();
    assert_eq!(state.store.list_users().await.unwrap().len(), SHOPPERS.len() + 1);
    assert_eq!(state.store.list_products().await.unwrap().len(), 50);
  }
}
