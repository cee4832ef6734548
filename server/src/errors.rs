// calliope_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use calliope_ledger::LedgerError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Ledger Error: {0}")]
  Ledger(#[from] LedgerError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Message shown to the client. Infrastructure details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::Forbidden(m) | AppError::NotFound(m) => m.clone(),
      AppError::Ledger(e) => match e {
        LedgerError::ProductNotFound(_) => "Product not found".to_string(),
        LedgerError::CartLineNotFound(_) => "Cart item not found".to_string(),
        LedgerError::UserNotFound(_) => "User not found".to_string(),
        LedgerError::Storage(_) => "Database operation failed".to_string(),
        other => other.to_string(),
      },
      AppError::Config(_) => "Configuration issue".to_string(),
      AppError::Internal(_) => "An internal error occurred".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Ledger(e) => match e {
        LedgerError::InvalidQuantity(_) | LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::ProductNotFound(_) | LedgerError::CartLineNotFound(_) | LedgerError::UserNotFound(_) => {
          StatusCode::NOT_FOUND
        }
        LedgerError::InsufficientStock { .. } | LedgerError::UsernameTaken(_) => StatusCode::CONFLICT,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }

    let mut body = json!({ "error": self.public_message() });
    if let AppError::Ledger(LedgerError::InsufficientStock {
      product_id,
      requested,
      available,
    }) = self
    {
      body["productId"] = json!(product_id);
      body["requested"] = json!(requested);
      body["available"] = json!(available);
    }
    HttpResponse::build(status).json(body)
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use uuid::Uuid;

  #[test]
  fn ledger_errors_map_to_statuses() {
    let cases = [
      (AppError::from(LedgerError::InvalidQuantity(0)), StatusCode::BAD_REQUEST),
      (AppError::from(LedgerError::ProductNotFound(Uuid::nil())), StatusCode::NOT_FOUND),
      (AppError::from(LedgerError::CartLineNotFound(Uuid::nil())), StatusCode::NOT_FOUND),
      (
        AppError::from(LedgerError::InsufficientStock {
          product_id: Uuid::nil(),
          requested: 2,
          available: 1,
        }),
        StatusCode::CONFLICT,
      ),
      (AppError::from(LedgerError::UsernameTaken("a".into())), StatusCode::CONFLICT),
      (AppError::Auth("Unauthorized".into()), StatusCode::UNAUTHORIZED),
      (AppError::Forbidden("Forbidden".into()), StatusCode::FORBIDDEN),
    ];
    for (err, status) in cases {
      assert_eq!(err.status_code(), status, "{}", err);
    }
  }

  #[test]
  fn not_found_messages_do_not_echo_identifiers() {
    let line_id = Uuid::new_v4();
    let err = AppError::from(LedgerError::CartLineNotFound(line_id));
    assert_eq!(err.public_message(), "Cart item not found");
    assert!(!err.public_message().contains(&line_id.to_string()));
    assert_eq!(AppError::Internal("pool exhausted".into()).public_message(), "An internal error occurred");
  }
}
