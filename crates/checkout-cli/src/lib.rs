//! Command-line storefront checkout client.
//!
//! Keeps the checkout session in a local SQLite database and talks to the
//! storefront REST API, with structured logging (tracing) and Prometheus
//! metrics.

pub mod commands;
pub mod config;

use anyhow::{Context, Result};
use checkout::StorefrontClient;
use domain::SummaryComposer;
use session_store::{SessionStore, SqliteBackend};

use commands::App;
use config::Config;

/// Connects to the session database and the storefront API.
pub async fn connect(config: &Config) -> Result<App<SqliteBackend>> {
    let checkout_config = config
        .checkout_config()
        .context("failed to load payment catalog")?;
    let backend = SqliteBackend::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open session database {}", config.database_url))?;
    let store = SessionStore::open(backend, SummaryComposer::new(checkout_config.pricing))
        .await
        .context("failed to load checkout session")?;
    let client = StorefrontClient::new(config.api_url.clone())
        .context("failed to build storefront client")?;
    Ok(App::new(store, client, checkout_config))
}
