// calliope_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/calliope_backend_db";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      _ => Err("expected 'pretty' or 'json'".to_string()),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub database_max_connections: u32,
  pub session_ttl_hours: i64,
  pub run_migrations: bool,
  pub seed_db: bool,
  pub log_format: LogFormat,
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, var_name: &str, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match lookup(var_name) {
    Some(raw) => raw
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
    None => Ok(default),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the config from any key/value source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or(&lookup, "SERVER_PORT", 3000u16)?;
    let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
    let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5u32)?;
    let session_ttl_hours = parse_or(&lookup, "SESSION_TTL_HOURS", 24i64)?;
    if session_ttl_hours <= 0 {
      return Err(AppError::Config(format!(
        "SESSION_TTL_HOURS must be positive (got {})",
        session_ttl_hours
      )));
    }
    let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;
    let seed_db = parse_or(&lookup, "SEED_DB", false)?;
    let log_format = parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      database_max_connections,
      session_ttl_hours,
      run_migrations,
      seed_db,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }

  pub fn session_ttl(&self) -> chrono::Duration {
    chrono::Duration::hours(self.session_ttl_hours)
  }
}
