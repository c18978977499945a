// handlers/public/auth/token.rs - POST /v1/tokens/authentication handler

use axum::extract::State;
use chrono::Duration;
use serde::Deserialize;

use crate::api::JsonBody;
use crate::auth::{validate_password_plaintext, Scope, Token};
use crate::database::models::validate_email;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;
use crate::validator::Validator;

/// Lifetime of a bearer token.
pub const AUTHENTICATION_TTL_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /v1/tokens/authentication - exchange email and password for a
/// bearer token
///
/// Unknown email and wrong password are indistinguishable to the client.
pub async fn create_authentication_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CredentialsInput>,
) -> ApiResult<Envelope<Token>> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    if !v.valid() {
        return Err(ApiError::failed_validation(v.into_errors()));
    }

    let user = match state.models.users.get_by_email(&input.email).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound) => return Err(ApiError::InvalidCredentials),
        Err(err) => return Err(err.into()),
    };

    if !user.password.matches(&input.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state
        .models
        .tokens
        .new_token(
            user.id,
            Duration::hours(AUTHENTICATION_TTL_HOURS),
            Scope::Authentication,
        )
        .await?;

    Ok(ApiResponse::created(envelope("authentication_token", token)))
}
