//! HTTP server layer
//!
//! Axum server with:
//! - JSON bodies in, JSON out
//! - `{code, message}` error envelope
//! - Per-request deadline
//! - Request tracing
//! - Graceful shutdown

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
