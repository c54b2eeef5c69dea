//! Axum server setup
//!
//! Server skeleton with:
//! - Permissive CORS (the API carries no credentials)
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::config::{ConfigError, ServerSection};
use crate::domain::Service;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    pub bind_addr: SocketAddr,

    /// Deadline applied to every use case (default: 30s)
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl TryFrom<&ServerSection> for ServerConfig {
    type Error = ConfigError;

    fn try_from(section: &ServerSection) -> Result<Self, Self::Error> {
        Ok(Self {
            bind_addr: section.bind_addr()?,
            request_timeout: section.request_timeout(),
        })
    }
}

/// Shared application state
pub struct AppState {
    pub service: Service,
    pub request_timeout: Duration,
}

/// Build the application router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::teams::router())
        .merge(routes::users::router())
        .merge(routes::pull_requests::router())
        .merge(routes::statistics::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server until a shutdown signal arrives and in-flight
/// requests drain.
///
/// # Example
///
/// ```ignore
/// let service = Service::new(TxManager::new(pool));
/// run_server(service, ServerConfig::default()).await?;
/// ```
pub async fn run_server(service: Service, config: ServerConfig) -> Result<(), ServerError> {
    let state = Arc::new(AppState {
        service,
        request_timeout: config.request_timeout,
    });
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        request_timeout = ?config.request_timeout,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn config_from_section() {
        let section = ServerSection {
            host: "127.0.0.1".into(),
            port: 3031,
            request_timeout_secs: 5,
        };
        let config = ServerConfig::try_from(&section).unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3031");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_host_is_rejected() {
        let section = ServerSection {
            host: "not an address".into(),
            ..ServerSection::default()
        };
        assert!(ServerConfig::try_from(&section).is_err());
    }
}
