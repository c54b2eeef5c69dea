//! Custom Axum extractors
//!
//! Thin wrappers over `Json` / `Query` whose rejections render as the
//! service's `{code, message}` envelope instead of axum's plain text.

use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::Json;

use super::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// URL query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
