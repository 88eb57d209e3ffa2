//! Tessera Server: bootstrap entry point.
//!
//! Connects to SurrealDB, applies pending migrations and reports the host
//! layout the access core will resolve tenants against.

use anyhow::{Context, Result};
use tessera_access::{AccessConfig, TenantResolver};
use tessera_db::{DbConfig, DbManager};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Access configuration from the JSON file at `path`, or the defaults when
/// no path is given.
fn load_access_config(path: Option<&str>) -> Result<AccessConfig> {
    let Some(path) = path else {
        return Ok(AccessConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read access config {path}"))?;
    let config: AccessConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse access config {path}"))?;
    info!(%path, "Loaded access configuration");
    Ok(config)
}

async fn run() -> Result<()> {
    let config_path = std::env::var("TESSERA_ACCESS_CONFIG").ok();
    let access = load_access_config(config_path.as_deref())?;
    let db_config = DbConfig::from_env();

    let manager = DbManager::connect(&db_config)
        .await
        .with_context(|| format!("Failed to connect to SurrealDB at {}", db_config.url))?;
    tessera_db::run_migrations(manager.client())
        .await
        .context("Failed to apply schema migrations")?;

    let resolver = TenantResolver::new(access);
    let config = resolver.config();
    info!(
        root_domain = %config.root_domain,
        product_owner_host = %config.product_owner_host(),
        internal_host = %config.internal_host(),
        subdomain_param = config.allow_subdomain_param,
        "Tenant resolution ready"
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tessera=info")),
        )
        .json()
        .init();

    info!("Starting Tessera server...");

    if let Err(e) = run().await {
        error!(error = %format!("{e:#}"), "Tessera server failed");
        std::process::exit(1);
    }

    info!("Tessera server stopped.");
}
