// calliope_server/src/web/handlers/admin_handlers.rs

//! Catalog maintenance and user listing; every route requires [`AdminUser`].

use actix_web::{web, HttpResponse};
use calliope_ledger::{CatalogStore, NewProduct, ProductPatch, UserStore};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

fn product_not_found() -> AppError {
  AppError::NotFound("Product not found".to_string())
}

#[instrument(name = "handler::admin_list_users", skip(app_state, admin), fields(admin_id = %admin.0.id))]
pub async fn list_users_handler(app_state: web::Data<AppState>, admin: AdminUser) -> Result<HttpResponse, AppError> {
  let users = app_state.store.list_users().await?;
  Ok(HttpResponse::Ok().json(users))
}

#[instrument(name = "handler::admin_create_product", skip(app_state, req_payload, admin), fields(admin_id = %admin.0.id))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<NewProduct>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state.store.create_product(req_payload.into_inner()).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[instrument(name = "handler::admin_update_product", skip(app_state, req_payload, admin), fields(admin_id = %admin.0.id))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  req_payload: web::Json<ProductPatch>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product = app_state
    .store
    .update_product(path.into_inner(), req_payload.into_inner())
    .await?
    .ok_or_else(product_not_found)?;
  info!(product_id = %product.id, "Product updated.");
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::admin_delete_product", skip(app_state, admin), fields(admin_id = %admin.0.id))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  admin: AdminUser,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if !app_state.store.delete_product(product_id).await? {
    return Err(product_not_found());
  }
  info!(%product_id, "Product deleted.");
  Ok(HttpResponse::NoContent().finish())
}
