// calliope_server/src/state.rs
use crate::config::AppConfig;
use calliope_ledger::{Ledger, Store};
use std::sync::Arc;

/// Per-app handles. Cloned into every worker; nothing here is a global.
#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub ledger: Ledger,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  pub fn new<S: Store + 'static>(store: Arc<S>, config: Arc<AppConfig>) -> Self {
    Self {
      ledger: Ledger::new(store.clone()),
      store,
      config,
    }
  }
}
