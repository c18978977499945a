// handlers/public/fallback.rs - responses for unrouted requests

use axum::http::Method;

use crate::error::ApiError;

/// No route matched the path.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// The path exists but not for this method.
pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::method_not_allowed(method.as_str())
}
