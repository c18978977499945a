// middleware/gates.rs - per-route authorization checks, layered after `authenticate`
//
// Routes stack them outermost first: authenticated, activated, permission.
use axum::{
    extract::{Request, State},
    http::Extensions,
    middleware::Next,
    response::Response,
};
use futures::future::{BoxFuture, FutureExt};

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::auth::{user_from_extensions, AuthUser};
use crate::state::AppState;

/// Any identified user.
pub async fn require_authenticated_user(request: Request, next: Next) -> Result<Response, ApiError> {
    if user_from_extensions(request.extensions()).is_anonymous() {
        return Err(ApiError::AuthenticationRequired);
    }
    Ok(next.run(request).await)
}

/// An identified user whose account has been activated.
pub async fn require_activated_user(request: Request, next: Next) -> Result<Response, ApiError> {
    activated_user(request.extensions())?;
    Ok(next.run(request).await)
}

/// Middleware fn for `from_fn_with_state` that admits activated users
/// holding `code`. Permissions are read from the store on every request.
/// Meant to sit inside `require_activated_user`.
pub fn require_permission(
    code: &'static str,
) -> impl Fn(State<AppState>, Request, Next) -> BoxFuture<'static, Result<Response, ApiError>>
       + Clone
       + Send
       + Sync
       + 'static {
    move |State(state): State<AppState>, request: Request, next: Next| {
        check_permission(state, code, request, next).boxed()
    }
}

async fn check_permission(
    state: AppState,
    code: &'static str,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = activated_user(request.extensions())?;

    let permissions = state.models.permissions.get_all_for_user(user.id).await?;
    if !permissions.include(code) {
        return Err(ApiError::NotPermitted);
    }

    Ok(next.run(request).await)
}

fn activated_user(extensions: &Extensions) -> Result<User, ApiError> {
    match user_from_extensions(extensions) {
        AuthUser::Anonymous => Err(ApiError::AuthenticationRequired),
        AuthUser::User(user) if !user.activated => Err(ApiError::InactiveAccount),
        AuthUser::User(user) => Ok(*user),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::StatusCode,
        middleware::from_fn,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn extensions_with(user: AuthUser) -> Extensions {
        let mut extensions = Extensions::new();
        extensions.insert(user);
        extensions
    }

    fn user(activated: bool) -> AuthUser {
        let mut user = User::new("Alice".into(), "alice@example.com".into());
        user.id = 1;
        user.activated = activated;
        AuthUser::User(Box::new(user))
    }

    #[test]
    fn anonymous_users_must_authenticate() {
        let result = activated_user(&extensions_with(AuthUser::Anonymous));
        assert!(matches!(result, Err(ApiError::AuthenticationRequired)));
    }

    #[test]
    fn inactive_users_are_refused() {
        let result = activated_user(&extensions_with(user(false)));
        assert!(matches!(result, Err(ApiError::InactiveAccount)));
    }

    #[test]
    fn activated_users_pass() {
        let result = activated_user(&extensions_with(user(true)));
        assert_eq!(result.unwrap().id, 1);
    }

    /// A router that stores `identity` the way `authenticate` would, then
    /// applies `gate` to its only route.
    async fn status_through<G, Fut>(gate: G, identity: AuthUser) -> StatusCode
    where
        G: Fn(Request, Next) -> Fut + Clone + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Response, ApiError>> + Send + 'static,
    {
        let router = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(from_fn(gate))
            .layer(from_fn(move |mut request: Request, next: Next| {
                request.extensions_mut().insert(identity.clone());
                next.run(request)
            }));

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        router.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn authenticated_gate_turns_away_anonymous_requests() {
        assert_eq!(
            status_through(require_authenticated_user, AuthUser::Anonymous).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_through(require_authenticated_user, user(false)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn activated_gate_checks_identity_then_activation() {
        assert_eq!(
            status_through(require_activated_user, AuthUser::Anonymous).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_through(require_activated_user, user(false)).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_through(require_activated_user, user(true)).await,
            StatusCode::OK
        );
    }
}
