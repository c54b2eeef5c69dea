//! Service configuration
//!
//! Loaded from a YAML file with three sections (`server`, `database`,
//! `log`). Database credentials may be overridden from the environment:
//! - `DATABASE_USER`
//! - `DATABASE_PASSWORD`

use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use thiserror::Error;

/// Name reported to Postgres as `application_name`.
pub const APP_NAME: &str = "reviewctl-server";

const DEFAULT_POSTGRES_PORT: u16 = 5432;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid server address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("invalid sslmode '{0}'")]
    SslMode(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSection,
    pub database: DatabaseSection,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Per-request deadline for use cases.
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl ServerSection {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub search_path: Option<String>,
    #[serde(default)]
    pub sslmode: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// How long a statement waits for a pooled connection.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

impl DatabaseSection {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Replace credentials with `DATABASE_USER` / `DATABASE_PASSWORD` when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("DATABASE_USER").ok(),
            std::env::var("DATABASE_PASSWORD").ok(),
        );
    }

    fn apply_overrides(&mut self, user: Option<String>, password: Option<String>) {
        if let Some(user) = user {
            self.user = user;
        }
        if let Some(password) = password {
            self.password = password;
        }
    }

    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let sslmode = self.sslmode.as_deref().unwrap_or("disable");
        let ssl_mode =
            PgSslMode::from_str(sslmode).map_err(|_| ConfigError::SslMode(sslmode.to_owned()))?;

        let mut options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port.filter(|p| *p > 0).unwrap_or(DEFAULT_POSTGRES_PORT))
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
            .ssl_mode(ssl_mode)
            .application_name(APP_NAME);

        if let Some(search_path) = self.search_path.as_deref().filter(|s| !s.is_empty()) {
            options = options.options([("search_path", search_path)]);
        }

        Ok(options)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub color: bool,
    pub title: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            color: false,
            title: APP_NAME.to_string(),
        }
    }
}

impl Config {
    /// Read and parse a YAML config file, then apply environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_yaml(&raw)?;
        config.database.apply_env_overrides();
        Ok(config)
    }

    /// Parse YAML without touching the environment.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}
