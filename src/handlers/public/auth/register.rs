// handlers/public/auth/register.rs - POST /v1/users handler

use axum::extract::State;
use chrono::Duration;
use serde::Deserialize;

use crate::api::JsonBody;
use crate::auth::Scope;
use crate::background;
use crate::database::models::{User, MOVIES_READ};
use crate::error::ApiError;
use crate::mailer::user_welcome;
use crate::middleware::{envelope, ApiResponse, ApiResult, Envelope};
use crate::state::AppState;
use crate::validator::Validator;

/// Lifetime of the token mailed to a new user.
pub const ACTIVATION_TTL_DAYS: i64 = 3;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /v1/users - register a new, not yet activated, user
///
/// New users get `movies:read` straight away. The activation token goes out
/// by email in the background, so the response is 202 and does not wait on
/// the SMTP server.
pub async fn register_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> ApiResult<Envelope<User>> {
    let mut user = User::new(input.name, input.email);
    user.password.set(&input.password)?;

    let mut v = Validator::new();
    user.validate(&mut v);
    if !v.valid() {
        return Err(ApiError::failed_validation(v.into_errors()));
    }

    state.models.users.insert(&mut user).await?;
    state.models.permissions.add_for_user(user.id, &[MOVIES_READ]).await?;

    let token = state
        .models
        .tokens
        .new_token(user.id, Duration::days(ACTIVATION_TTL_DAYS), Scope::Activation)
        .await?;

    let mailer = state.mailer.clone();
    let recipient = user.email.clone();
    let email = user_welcome(user.id, &token.plaintext);
    background::spawn(&state.tasks, "welcome email", async move {
        if let Err(err) = mailer.send(&recipient, email).await {
            tracing::error!("Failed to send welcome email: {}", err);
        }
    });

    Ok(ApiResponse::accepted(envelope("user", user)))
}
