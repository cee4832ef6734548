// calliope_server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;

use crate::errors::AppError;
use crate::services::auth_service::{self, Registration};
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

#[derive(Deserialize, Debug)]
pub struct LoginRequestPayload {
  pub username: String,
  pub password: String,
}

#[instrument(name = "handler::register", skip(app_state, req_payload), fields(username = %req_payload.username))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<Registration>,
) -> Result<HttpResponse, AppError> {
  let session = auth_service::register(&app_state, req_payload.into_inner(), false).await?;
  Ok(HttpResponse::Created().json(session))
}

#[instrument(name = "handler::login", skip(app_state, req_payload), fields(username = %req_payload.username))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequestPayload>,
) -> Result<HttpResponse, AppError> {
  let LoginRequestPayload { username, password } = req_payload.into_inner();
  if username.trim().is_empty() || password.is_empty() {
    return Err(AppError::Validation("Username and password are required.".to_string()));
  }
  let session = auth_service::login(&app_state, username.trim(), &password).await?;
  Ok(HttpResponse::Ok().json(session))
}

#[instrument(name = "handler::logout", skip(app_state, auth_user), fields(user_id = %auth_user.user.id))]
pub async fn logout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  auth_service::logout(&app_state, &auth_user.token).await?;
  Ok(HttpResponse::NoContent().finish())
}

pub async fn me_handler(auth_user: AuthenticatedUser) -> HttpResponse {
  HttpResponse::Ok().json(auth_user.user)
}
