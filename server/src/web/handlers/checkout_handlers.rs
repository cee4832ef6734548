// calliope_server/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use calliope_ledger::CheckoutOutcome;
use serde_json::json;
use tracing::instrument;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[instrument(name = "handler::checkout", skip(app_state, auth_user), fields(user_id = %auth_user.user.id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let body = match app_state.ledger.checkout(auth_user.user.id).await? {
    CheckoutOutcome::Completed(order) => json!({ "message": "Checkout successful!", "order": order }),
    CheckoutOutcome::EmptyCart => json!({ "message": "Cart is empty; nothing to check out." }),
  };
  Ok(HttpResponse::Ok().json(body))
}

#[instrument(name = "handler::order_history", skip(app_state, auth_user), fields(user_id = %auth_user.user.id))]
pub async fn order_history_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.ledger.order_history(auth_user.user.id).await?;
  Ok(HttpResponse::Ok().json(orders))
}
