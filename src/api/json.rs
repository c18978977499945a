// api/json.rs - strict JSON request bodies
use axum::{
    async_trait,
    extract::{FromRequest, Request},
};
use http_body_util::LengthLimitError;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::ApiError;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1_048_576;

/// JSON body extractor. Unlike `axum::Json` it does not look at
/// Content-Type, and every failure becomes a 400 with a message the client
/// can act on. Unknown fields are rejected by `deny_unknown_fields` on the
/// target type.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
            .await
            .map_err(|err| {
                if err.into_inner().downcast_ref::<LengthLimitError>().is_some() {
                    ApiError::bad_request(format!(
                        "body must not be larger than {} bytes",
                        MAX_BODY_BYTES
                    ))
                } else {
                    ApiError::bad_request("body could not be read")
                }
            })?;

        decode(&bytes).map(JsonBody)
    }
}

/// Decode exactly one JSON value from `bytes`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("body must not be empty"));
    }

    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = T::deserialize(&mut de).map_err(describe)?;
    de.end()
        .map_err(|_| ApiError::bad_request("body must only contain a single JSON value"))?;

    Ok(value)
}

fn describe(err: serde_json::Error) -> ApiError {
    let message = match err.classify() {
        Category::Syntax => format!(
            "body contains badly-formed JSON (at line {}, column {})",
            err.line(),
            err.column()
        ),
        Category::Eof => "body contains badly-formed JSON".to_string(),
        Category::Data => {
            let raw = err.to_string();
            let detail = match raw.rfind(" at line ") {
                Some(idx) => &raw[..idx],
                None => raw.as_str(),
            };
            if let Some(rest) = detail.strip_prefix("unknown field `") {
                let key = rest.split('`').next().unwrap_or_default();
                format!("body contains unknown key \"{}\"", key)
            } else if detail.starts_with("invalid type") {
                "body contains incorrect JSON type".to_string()
            } else {
                detail.to_string()
            }
        }
        Category::Io => {
            tracing::error!("Reading JSON body: {}", err);
            "body could not be read".to_string()
        }
    };
    ApiError::bad_request(message)
}
