//! Request extractors whose rejections use the API error format

use crate::error::ApiError;
use axum::extract::FromRequest;

/// `axum::Json` with rejections answered as [`ApiError`]
///
/// Malformed bodies, wrong field types and a missing `Content-Type` all come
/// back as a JSON 400 instead of axum's plain-text response.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
