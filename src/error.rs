// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::auth::PasswordError;
use crate::database::DatabaseError;

pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";
pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
pub const EDIT_CONFLICT_MESSAGE: &str =
    "unable to update the record due to an edit conflict, please try again";

/// HTTP API error with status code and client-facing message. Every variant
/// renders as `{"error": ...}`.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    InvalidCredentials,
    InvalidAuthenticationToken,
    AuthenticationRequired,

    // 403 Forbidden
    InactiveAccount,
    NotPermitted,

    // 404 Not Found
    NotFound,

    // 405 Method Not Allowed
    MethodNotAllowed(String),

    // 409 Conflict
    EditConflict,

    // 422 Unprocessable Entity
    FailedValidation(BTreeMap<String, String>),

    // 429 Too Many Requests
    RateLimitExceeded,

    // 500 Internal Server Error
    ServerError,
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::InvalidAuthenticationToken
            | ApiError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            ApiError::InactiveAccount | ApiError::NotPermitted => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message. Validation failures report a summary here; the
    /// field map only appears in the JSON body.
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::InvalidCredentials => "invalid authentication credentials".into(),
            ApiError::InvalidAuthenticationToken => "invalid or missing authentication token".into(),
            ApiError::AuthenticationRequired => {
                "you must be authenticated to access this resource".into()
            }
            ApiError::InactiveAccount => {
                "your user account must be activated to access this resource".into()
            }
            ApiError::NotPermitted => {
                "your user account doesn't have the necessary permissions to access this resource"
                    .into()
            }
            ApiError::NotFound => NOT_FOUND_MESSAGE.into(),
            ApiError::MethodNotAllowed(method) => {
                format!("the {} method is not supported for this resource", method)
            }
            ApiError::EditConflict => EDIT_CONFLICT_MESSAGE.into(),
            ApiError::FailedValidation(_) => "failed validation".into(),
            ApiError::RateLimitExceeded => "rate limit exceeded".into(),
            ApiError::ServerError => SERVER_ERROR_MESSAGE.into(),
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::FailedValidation(errors) => json!({ "error": errors }),
            _ => json!({ "error": self.message() }),
        }
    }
}

// Constructors
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn failed_validation(errors: BTreeMap<String, String>) -> Self {
        ApiError::FailedValidation(errors)
    }

    /// Single-field validation failure.
    pub fn field(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(key.into(), message.into());
        ApiError::FailedValidation(errors)
    }

    pub fn method_not_allowed(method: impl Into<String>) -> Self {
        ApiError::MethodNotAllowed(method.into())
    }

    /// Log the underlying cause and return the generic 500.
    pub fn server_error(err: impl std::fmt::Display) -> Self {
        tracing::error!("{}", err);
        ApiError::ServerError
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound => ApiError::NotFound,
            DatabaseError::EditConflict => ApiError::EditConflict,
            DatabaseError::DuplicateEmail => {
                ApiError::field("email", "a user with this email address already exists")
            }
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::ServerError
            }
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!("Password error: {}", err);
        ApiError::ServerError
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        if matches!(self, ApiError::InvalidAuthenticationToken) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
