// calliope_ledger/src/error.rs
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Quantity must be a positive integer (got {0})")]
    InvalidQuantity(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    // Also returned when the line exists but belongs to another user.
    #[error("Cart line not found: {0}")]
    CartLineNotFound(Uuid),

    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl LedgerError {
    /// True for the not-found family, which callers surface identically.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::ProductNotFound(_) | LedgerError::CartLineNotFound(_) | LedgerError::UserNotFound(_)
        )
    }
}

pub type LedgerResult<T, E = LedgerError> = std::result::Result<T, E>;
