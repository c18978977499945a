// handlers/public/auth/activate.rs - PUT /v1/users/activated handler

use axum::extract::State;
use serde::Deserialize;

use crate::api::JsonBody;
use crate::auth::{validate_token_plaintext, Scope};
use crate::database::models::User;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;
use crate::validator::Validator;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActivateInput {
    #[serde(default)]
    pub token: String,
}

/// PUT /v1/users/activated - activate the account an activation token was
/// issued for, then revoke all of that user's activation tokens.
pub async fn activate_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ActivateInput>,
) -> ApiResult<Envelope<User>> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    if !v.valid() {
        return Err(ApiError::failed_validation(v.into_errors()));
    }

    let mut user = match state
        .models
        .users
        .get_for_token(Scope::Activation, &input.token)
        .await
    {
        Ok(user) => user,
        Err(DatabaseError::NotFound) => {
            return Err(ApiError::field("token", "invalid or expired activation token"))
        }
        Err(err) => return Err(err.into()),
    };

    user.activated = true;
    state.models.users.update(&mut user).await?;

    state
        .models
        .tokens
        .delete_all_for_user(Scope::Activation, user.id)
        .await?;

    Ok(ApiResponse::success(envelope("user", user)))
}
