//! Tracing setup for reviewctl-server
//!
//! Level comes from `log.level` unless `RUST_LOG` is set:
//!   RUST_LOG=reviewctl_server=debug,sqlx=warn reviewctl-server ...
//!
//! `log.format` picks compact text or one JSON object per line.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, LogFormat};

/// Filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber.
pub fn init(config: &LogConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_ansi(config.color);

    let installed = match config.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(true)
            .flatten_event(true)
            .try_init(),
        LogFormat::Text => builder.compact().with_target(false).try_init(),
    };
    installed.map_err(|err| anyhow!(err))?;

    tracing::info!(title = %config.title, format = ?config.format, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_used_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig {
            level: "warn".into(),
            ..LogConfig::default()
        };
        assert_eq!(env_filter(&config).to_string(), "warn");
    }
}
