//! reviewctl-server: pull request reviewer assignment service
//!
//! Teams register their members; opening a pull request assigns up to two
//! active teammates of the author as reviewers. Reviewers can be swapped
//! for another active teammate until the PR is merged.
//!
//! Layers:
//! - [`http`]: axum routes, `{code, message}` error envelope
//! - [`domain`]: use cases, reviewer selection, injectable clock and RNG
//! - [`db`]: Postgres pool, request-scoped transactions, repositories

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod http;
pub mod logging;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
