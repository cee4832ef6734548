// calliope_ledger/src/store/postgres.rs

//! PostgreSQL store.
//!
//! Queries are checked at runtime (`query_as` + `bind`) so the crate builds
//! without a live database. The schema lives in `core/migrations`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{CartStore, CatalogStore, SessionStore, UserStore};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    CartEntry, CartLine, CheckoutOutcome, NewProduct, NewUser, Order, OrderItem, Product, ProductPatch, User,
};

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
const PG_NUMERIC_OUT_OF_RANGE: &str = "22003";

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, image_url, stock, created_at";
const USER_COLUMNS: &str = "id, username, password_hash, is_admin, name, email_address, phone, \
                                                        shipping_address, mailing_address, created_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

// A cart line as seen inside the checkout transaction, with its product row locked.
#[derive(Debug, FromRow)]
struct LockedLine {
    line_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    stock: i32,
    price_cents: i32,
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    total_cents: i64,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn with_items(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            total_cents: self.total_cents,
            created_at: self.created_at,
            items,
        }
    }
}

fn db_error_code(err: &sqlx::Error) -> Option<String> {
    err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code.into_owned())
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> LedgerResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to PostgreSQL.");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> LedgerResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(sqlx::Error::from(e)))?;
        info!("Database migrations applied.");
        Ok(())
    }
}

#[async_trait]
impl CartStore for PgStore {
    #[instrument(name = "pg::upsert_cart_line", skip(self), err(Display))]
    async fn upsert_cart_line(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> LedgerResult<CartLine> {
        // Single statement: the unique (user_id, product_id) constraint turns a
        // concurrent duplicate insert into an increment instead of a second row.
        let result = sqlx::query_as::<_, CartLine>(
            r#"
            INSERT INTO cart_lines (id, user_id, product_id, quantity)
            SELECT $1, $2, p.id, $4 FROM products p WHERE p.id = $3
            ON CONFLICT (user_id, product_id) DO UPDATE
                SET quantity = cart_lines.quantity + EXCLUDED.quantity
            RETURNING id, user_id, product_id, quantity, added_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(line)) => Ok(line),
            Ok(None) => Err(LedgerError::ProductNotFound(product_id)),
            Err(e) => match db_error_code(&e).as_deref() {
                Some(PG_FOREIGN_KEY_VIOLATION) => Err(LedgerError::ProductNotFound(product_id)),
                Some(PG_NUMERIC_OUT_OF_RANGE) => Err(LedgerError::InvalidQuantity(quantity)),
                _ => Err(LedgerError::Storage(e)),
            },
        }
    }

    async fn set_cart_line_quantity(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        quantity: i32,
    ) -> LedgerResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            "UPDATE cart_lines SET quantity = $1 WHERE id = $2 AND user_id = $3 \
             RETURNING id, user_id, product_id, quantity, added_at",
        )
        .bind(quantity)
        .bind(line_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(line)
    }

    async fn delete_cart_line(&self, user_id: Uuid, line_id: Uuid) -> LedgerResult<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = $1 AND user_id = $2")
            .bind(line_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn cart_entries(&self, user_id: Uuid) -> LedgerResult<Vec<CartEntry>> {
        let entries = sqlx::query_as::<_, CartEntry>(
            r#"
            SELECT c.id AS cart_line_id, p.id AS product_id, p.name, p.price_cents, p.image_url, c.quantity
            FROM cart_lines c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.added_at ASC, c.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    #[instrument(name = "pg::checkout", skip(self), err(Display))]
    async fn checkout(&self, user_id: Uuid) -> LedgerResult<CheckoutOutcome> {
        let mut tx = self.pool.begin().await?;

        // The user row lock blocks new cart lines for this user (their foreign key
        // check needs a key-share lock on it) until this transaction ends.
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // Locks the user's lines and their product rows. Ordering by product id
        // keeps lock acquisition order stable across concurrent checkouts.
        let lines = sqlx::query_as::<_, LockedLine>(
            r#"
            SELECT c.id AS line_id, c.product_id, c.quantity, p.stock, p.price_cents
            FROM cart_lines c
            JOIN products p ON p.id = c.product_id
            WHERE c.user_id = $1
            ORDER BY c.product_id
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            debug!("Cart is empty; nothing to check out.");
            return Ok(CheckoutOutcome::EmptyCart);
        }

        // Returning early drops `tx`, which rolls back.
        if let Some(short) = lines.iter().find(|l| l.quantity > l.stock) {
            warn!(
                product_id = %short.product_id,
                requested = short.quantity,
                available = short.stock,
                "Insufficient stock; checkout rolled back."
            );
            return Err(LedgerError::InsufficientStock {
                product_id: short.product_id,
                requested: short.quantity,
                available: short.stock,
            });
        }

        for line in &lines {
            let updated = sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1")
                .bind(line.quantity)
                .bind(line.product_id)
                .execute(&mut *tx)
                .await?;
            if updated.rows_affected() != 1 {
                error!(product_id = %line.product_id, "Conditional stock decrement matched no row under lock.");
                return Err(LedgerError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: line.stock,
                });
            }
        }

        let total_cents: i64 = lines
            .iter()
            .map(|l| i64::from(l.price_cents) * i64::from(l.quantity))
            .sum();
        let order = sqlx::query_as::<_, OrderRow>(
            "INSERT INTO orders (id, user_id, total_cents) VALUES ($1, $2, $3) \
             RETURNING id, user_id, total_cents, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(total_cents)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = sqlx::query_as::<_, OrderItem>(
                "INSERT INTO order_items (id, order_id, product_id, quantity, price_at_purchase_cents) \
                 VALUES ($1, $2, $3, $4, $5) \
                 RETURNING id, order_id, product_id, quantity, price_at_purchase_cents",
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price_cents)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        // Only the lines that were checked and ordered.
        let line_ids: Vec<Uuid> = lines.iter().map(|l| l.line_id).collect();
        sqlx::query("DELETE FROM cart_lines WHERE id = ANY($1) AND user_id = $2")
            .bind(line_ids.as_slice())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(order_id = %order.id, line_count = items.len(), total_cents, "Checkout committed.");
        Ok(CheckoutOutcome::Completed(order.with_items(items)))
    }

    async fn orders_for_user(&self, user_id: Uuid) -> LedgerResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            "SELECT id, user_id, total_cents, created_at FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, price_at_purchase_cents \
             FROM order_items WHERE order_id = ANY($1) ORDER BY product_id",
        )
        .bind(order_ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        Ok(
            orders
                .into_iter()
                .map(|row| {
                    let items = by_order.remove(&row.id).unwrap_or_default();
                    row.with_items(items)
                })
                .collect(),
        )
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products ORDER BY name ASC, id ASC",
            PRODUCT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn product_by_id(&self, product_id: Uuid) -> LedgerResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    async fn create_product(&self, new_product: NewProduct) -> LedgerResult<Product> {
        new_product.validate()?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (id, name, description, price_cents, image_url, stock) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price_cents)
        .bind(&new_product.image_url)
        .bind(new_product.stock)
        .fetch_one(&self.pool)
        .await?;
        Ok(product)
    }

    async fn update_product(&self, product_id: Uuid, patch: ProductPatch) -> LedgerResult<Option<Product>> {
        patch.validate()?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET \
                 name = COALESCE($2, name), \
                 description = COALESCE($3, description), \
                 price_cents = COALESCE($4, price_cents), \
                 image_url = COALESCE($5, image_url), \
                 stock = COALESCE($6, stock) \
             WHERE id = $1 RETURNING {}",
            PRODUCT_COLUMNS
        ))
        .bind(product_id)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.price_cents)
        .bind(&patch.image_url)
        .bind(patch.stock)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn delete_product(&self, product_id: Uuid) -> LedgerResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> LedgerResult<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (id, username, password_hash, is_admin, name, email_address, phone, shipping_address, mailing_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.password_hash)
        .bind(new_user.is_admin)
        .bind(&new_user.name)
        .bind(&new_user.email_address)
        .bind(&new_user.phone)
        .bind(&new_user.shipping_address)
        .bind(&new_user.mailing_address)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(e) if db_error_code(&e).as_deref() == Some(PG_UNIQUE_VIOLATION) => {
                Err(LedgerError::UsernameTaken(new_user.username))
            }
            Err(e) => Err(LedgerError::Storage(e)),
        }
    }

    async fn user_by_username(&self, username: &str) -> LedgerResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_id(&self, user_id: Uuid) -> LedgerResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn list_users(&self) -> LedgerResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, username ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, token: &str, user_id: Uuid, expires_at: DateTime<Utc>) -> LedgerResult<()> {
        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_user(&self, token: &str, now: DateTime<Utc>) -> LedgerResult<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM sessions WHERE token = $1 AND expires_at > $2")
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }

    async fn delete_session(&self, token: &str) -> LedgerResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
