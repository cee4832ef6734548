// calliope_server/src/services/auth_service.rs

//! Registration, login and bearer-session resolution.
//!
//! Passwords are hashed with Argon2 on actix's blocking pool. Sessions are
//! opaque 256-bit random tokens stored with an expiry; the token itself is
//! the only credential a client holds.

use std::fmt::Write as _;

use actix_web::web;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use calliope_ledger::{NewUser, SessionStore, User, UserStore};
use chrono::Utc;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{AppError, Result};
use crate::state::AppState;

const MAX_USERNAME_LEN: usize = 49;
const MIN_PASSWORD_LEN: usize = 6;
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
  pub username: String,
  pub password: String,
  pub name: String,
  #[serde(alias = "email_address")]
  pub email_address: String,
  pub phone: Option<String>,
  #[serde(alias = "shipping_address")]
  pub shipping_address: String,
  #[serde(alias = "mailing_address")]
  pub mailing_address: String,
}

#[derive(Debug, Serialize)]
pub struct AuthSession {
  pub user: User,
  pub token: String,
}

impl Registration {
  pub fn validate(&self) -> Result<()> {
    let username = self.username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
      return Err(AppError::Validation(format!(
        "Username must be between 1 and {} characters.",
        MAX_USERNAME_LEN
      )));
    }
    if self.password.chars().count() < MIN_PASSWORD_LEN {
      return Err(AppError::Validation(format!(
        "Password must be at least {} characters long.",
        MIN_PASSWORD_LEN
      )));
    }
    if !self.email_address.contains('@') {
      return Err(AppError::Validation("A valid email address is required.".to_string()));
    }
    for (field, value) in [
      ("name", &self.name),
      ("shippingAddress", &self.shipping_address),
      ("mailingAddress", &self.mailing_address),
    ] {
      if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required.", field)));
      }
    }
    Ok(())
  }
}

pub fn hash_password(password: &str) -> Result<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty.".to_string()));
  }
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| {
      error!(error = %e, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing failed: {}", e))
    })
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unusable.
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool> {
  let parsed = PasswordHash::new(stored_hash).map_err(|e| {
    error!(error = %e, "Stored password hash could not be parsed.");
    AppError::Internal(format!("Invalid stored password hash: {}", e))
  })?;
  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(e) => {
      error!(error = %e, "Argon2 password verification failed.");
      Err(AppError::Internal(format!("Password verification failed: {}", e)))
    }
  }
}

/// 64 hex characters of OS randomness.
pub fn generate_session_token() -> String {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  bytes.iter().fold(String::with_capacity(TOKEN_BYTES * 2), |mut out, b| {
    let _ = write!(out, "{:02x}", b);
    out
  })
}

/// [`hash_password`] on actix's blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String> {
  web::block(move || hash_password(&password))
    .await
    .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(stored_hash: String, password: String) -> Result<bool> {
  web::block(move || verify_password(&stored_hash, &password))
    .await
    .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
}

async fn open_session(state: &AppState, user: User) -> Result<AuthSession> {
  let token = generate_session_token();
  let expires_at = Utc::now() + state.config.session_ttl();
  state.store.create_session(&token, user.id, expires_at).await?;
  debug!(user_id = %user.id, %expires_at, "Session opened.");
  Ok(AuthSession { user, token })
}

/// Creates the account and opens a session for it.
#[instrument(name = "auth_service::register", skip(state, registration), fields(username = %registration.username), err(Display))]
pub async fn register(state: &AppState, registration: Registration, is_admin: bool) -> Result<AuthSession> {
  registration.validate()?;
  let password_hash = hash_password_blocking(registration.password.clone()).await?;
  let user = state
    .store
    .create_user(NewUser {
      username: registration.username.trim().to_string(),
      password_hash,
      is_admin,
      name: registration.name,
      email_address: registration.email_address,
      phone: registration.phone,
      shipping_address: registration.shipping_address,
      mailing_address: registration.mailing_address,
    })
    .await?;
  info!(user_id = %user.id, is_admin, "User registered.");
  open_session(state, user).await
}

#[instrument(name = "auth_service::login", skip(state, password), err(Display))]
pub async fn login(state: &AppState, username: &str, password: &str) -> Result<AuthSession> {
  let invalid = || AppError::Auth("Invalid credentials".to_string());
  let Some(user) = state.store.user_by_username(username).await? else {
    warn!("Login for unknown username.");
    return Err(invalid());
  };
  if !verify_blocking(user.password_hash.clone(), password.to_string()).await? {
    warn!(user_id = %user.id, "Login with wrong password.");
    return Err(invalid());
  }
  info!(user_id = %user.id, "User logged in.");
  open_session(state, user).await
}

/// Resolves a bearer token to its user; unknown or expired tokens are rejected.
pub async fn authenticate_token(state: &AppState, token: &str) -> Result<User> {
  let expired = || AppError::Auth("Invalid or expired token".to_string());
  let user_id = state.store.session_user(token, Utc::now()).await?.ok_or_else(expired)?;
  state.store.user_by_id(user_id).await?.ok_or_else(expired)
}

pub async fn logout(state: &AppState, token: &str) -> Result<()> {
  state.store.delete_session(token).await?;
  Ok(())
}
