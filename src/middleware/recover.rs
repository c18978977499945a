use axum::{
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::any::Any;

use crate::background::panic_message;
use crate::error::ApiError;

/// Panic handler for `CatchPanicLayer`: log the payload, answer with the
/// generic 500 and ask the client to drop the connection.
pub fn recover_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("panic while handling request: {}", panic_message(&*err));

    let mut response = ApiError::ServerError.into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
