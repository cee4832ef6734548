// calliope_server/src/web/extractors.rs

//! Bearer-token resolution: `Authorization: Bearer <token>` to a user.
//!
//! [`resolve_bearer`] runs on every `/api` request. A present token must be
//! valid on any route; the resolved user is stashed in the request extensions
//! for the guards below.

use actix_web::{
  body::MessageBody,
  dev::{Payload, ServiceRequest, ServiceResponse},
  http::header,
  middleware::Next,
  web, FromRequest, HttpMessage, HttpRequest,
};
use calliope_ledger::User;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
  pub user: User,
  pub token: String,
}

/// An authenticated user whose account carries the admin flag.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn bearer_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
  let token = value.strip_prefix("Bearer ")?.trim();
  (!token.is_empty()).then(|| token.to_string())
}

/// Rejects requests carrying an unknown or expired token, public routes included.
pub async fn resolve_bearer(
  req: ServiceRequest,
  next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
  if let Some(token) = bearer_token(req.request()) {
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let resolved = match state {
      Some(state) => auth_service::authenticate_token(&state, &token).await,
      None => Err(AppError::Internal("AppState not registered".to_string())),
    };
    match resolved {
      Ok(user) => {
        req.extensions_mut().insert(AuthenticatedUser { user, token });
      }
      Err(e) => return Ok(req.error_response(e).map_into_right_body()),
    }
  }
  next.call(req).await.map(ServiceResponse::map_into_left_body)
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    if let Some(resolved) = req.extensions().get::<AuthenticatedUser>().cloned() {
      return Box::pin(async move { Ok(resolved) });
    }
    let state = req.app_data::<web::Data<AppState>>().cloned();
    let token = bearer_token(req);
    Box::pin(async move {
      let state = state.ok_or_else(|| AppError::Internal("AppState not registered".to_string()))?;
      let Some(token) = token else {
        warn!("Request without bearer token.");
        return Err(AppError::Auth("Unauthorized".to_string()));
      };
      let user = auth_service::authenticate_token(&state, &token).await?;
      Ok(AuthenticatedUser { user, token })
    })
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let authenticated = AuthenticatedUser::from_request(req, payload);
    Box::pin(async move {
      let AuthenticatedUser { user, .. } = authenticated.await?;
      if !user.is_admin {
        warn!(user_id = %user.id, "Non-admin attempted an admin route.");
        return Err(AppError::Forbidden("Forbidden".to_string()));
      }
      Ok(AdminUser(user))
    })
  }
}
