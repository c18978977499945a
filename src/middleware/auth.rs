use axum::{
    extract::{Request, State},
    http::{header, Extensions, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{validate_token_plaintext, Scope};
use crate::database::models::User;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validator::Validator;

/// Identity attached to every request by `authenticate`.
#[derive(Clone, Debug)]
pub enum AuthUser {
    Anonymous,
    User(Box<User>),
}

impl AuthUser {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthUser::Anonymous)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthUser::Anonymous => None,
            AuthUser::User(user) => Some(user),
        }
    }
}

/// Identity stored by `authenticate`. Reading it before that middleware has
/// run is a wiring bug, so this panics instead of rejecting.
pub(crate) fn user_from_extensions(extensions: &Extensions) -> AuthUser {
    match extensions.get::<AuthUser>() {
        Some(user) => user.clone(),
        None => panic!("missing user value in request context"),
    }
}

/// Resolve the bearer token, if any, to a user and store it on the request.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&state, request.headers()).await;
    let mut response = match resolved {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    };

    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    response
}

async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(AuthUser::Anonymous),
    };

    let token = bearer_token(value).ok_or(ApiError::InvalidAuthenticationToken)?;

    match state
        .models
        .users
        .get_for_token(Scope::Authentication, &token)
        .await
    {
        Ok(user) => Ok(AuthUser::User(Box::new(user))),
        Err(DatabaseError::NotFound) => Err(ApiError::InvalidAuthenticationToken),
        Err(err) => Err(err.into()),
    }
}

/// `Bearer <token>` with exactly one space and a well-formed token.
fn bearer_token(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?;
    let parts: Vec<&str> = raw.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return None;
    }

    let mut v = Validator::new();
    validate_token_plaintext(&mut v, parts[1]);
    v.valid().then(|| parts[1].to_string())
}
