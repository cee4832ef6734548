// calliope_server/src/main.rs

use std::sync::Arc;

use actix_web::{web::Data, App, HttpServer};
use anyhow::Context;
use calliope_ledger::PgStore;
use calliope_server::config::{AppConfig, LogFormat};
use calliope_server::seed;
use calliope_server::state::AppState;
use calliope_server::web::configure_app_routes;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

fn init_tracing(format: LogFormat) {
  // RUST_LOG overrides the default level.
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Pretty => builder.init(),
    LogFormat::Json => builder.json().init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  let app_config = Arc::new(AppConfig::from_env().context("Failed to load application configuration")?);
  init_tracing(app_config.log_format);
  tracing::info!("Starting Calliope storefront server...");

  let store = PgStore::connect(&app_config.database_url, app_config.database_max_connections)
    .await
    .context("Failed to connect to the database")?;
  tracing::info!("Successfully connected to the database.");

  if app_config.run_migrations {
    store.migrate().await.context("Failed to apply database migrations")?;
    tracing::info!("Database migrations applied.");
  }

  let app_state = AppState::new(Arc::new(store), app_config.clone());

  if app_config.seed_db {
    seed::run(&app_state).await.context("Failed to seed the database")?;
  }

  let server_address = app_config.bind_address();
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await
  .context("Server terminated with an error")
}
