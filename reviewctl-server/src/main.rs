//! reviewctl-server binary
//!
//! Loads `.env`, reads the YAML config, applies the schema and serves the
//! HTTP API until Ctrl+C / SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use reviewctl_server::config::Config;
use reviewctl_server::db::{create_pool, migrations, TxManager};
use reviewctl_server::domain::Service;
use reviewctl_server::http::{run_server, ServerConfig};
use reviewctl_server::logging;

#[derive(Parser, Debug)]
#[command(
    name = "reviewctl-server",
    version,
    about = "Assigns pull request reviewers from the author's team"
)]
struct Args {
    /// Path to the YAML config file
    #[arg(long, short = 'c', env = "REVIEWCTL_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    logging::init(&config.log).context("Failed to initialize logging")?;
    tracing::info!(
        title = %config.log.title,
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "Starting"
    );

    let server_config = ServerConfig::try_from(&config.server).context("Invalid server section")?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    migrations::run(&pool)
        .await
        .context("Failed to apply schema migrations")?;

    let service = Service::new(TxManager::new(pool.clone()));
    let served = run_server(service, server_config).await.context("Server error");

    pool.close().await;
    tracing::info!("Database pool closed");
    served
}
