// calliope_server/src/web/handlers/cart_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequestPayload {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct UpdateCartLinePayload {
  pub quantity: i32,
}

#[instrument(name = "handler::get_cart", skip(app_state, auth_user), fields(user_id = %auth_user.user.id))]
pub async fn get_cart_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let cart = app_state.ledger.get_cart(auth_user.user.id).await?;
  Ok(HttpResponse::Ok().json(cart))
}

#[instrument(
    name = "handler::add_to_cart",
    skip(app_state, req_payload, auth_user),
    fields(user_id = %auth_user.user.id, product_id = %req_payload.product_id, quantity = req_payload.quantity)
)]
pub async fn add_to_cart_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<AddToCartRequestPayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let line = app_state
    .ledger
    .add_to_cart(auth_user.user.id, req_payload.product_id, req_payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(line))
}

#[instrument(name = "handler::update_cart_line", skip(app_state, req_payload, auth_user), fields(user_id = %auth_user.user.id))]
pub async fn update_cart_line_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<UpdateCartLinePayload>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let line = app_state
    .ledger
    .update_cart_line(auth_user.user.id, path.into_inner(), req_payload.quantity)
    .await?;
  Ok(HttpResponse::Ok().json(line))
}

#[instrument(name = "handler::remove_cart_line", skip(app_state, auth_user), fields(user_id = %auth_user.user.id))]
pub async fn remove_cart_line_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state
    .ledger
    .remove_cart_line(auth_user.user.id, path.into_inner())
    .await?;
  Ok(HttpResponse::NoContent().finish())
}
