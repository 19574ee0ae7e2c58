//! Crate entrypoint wiring together configuration, DB, DNS, and APIs.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod dns;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod secrets;
pub mod validation;

use config::AppConfig;
use db::Db;
use dns::DnsUpdater;

use std::sync::Arc;

/// Complete application dependencies shared across handlers.
pub struct AppState {
    pub config: AppConfig,
    pub db: Db,
    pub dns: Arc<dyn DnsUpdater>,
}

/// Arc-wrapped version of `AppState` passed into Axum extensions.
pub type SharedState = Arc<AppState>;
