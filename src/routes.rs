// routes.rs - route table and the global middleware stack
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, patch, post, put, MethodRouter},
    Router,
};
use std::time::Duration;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::database::models::{MOVIES_READ, MOVIES_WRITE};
use crate::handlers::protected::movies;
use crate::handlers::public::{self, auth};
use crate::middleware::{
    authenticate, enable_cors, rate_limit, recover_panic, require_activated_user,
    require_authenticated_user, require_permission, track_metrics,
};
use crate::state::AppState;

/// The complete application: routes, fallbacks and middleware.
pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .route("/v1/healthcheck", allow(get(public::healthcheck)))
        .route(
            "/v1/movies",
            allow(
                gated(&state, MOVIES_READ, get(movies::list_movies))
                    .merge(gated(&state, MOVIES_WRITE, post(movies::create_movie))),
            ),
        )
        .route(
            "/v1/movies/:id",
            allow(
                gated(&state, MOVIES_READ, get(movies::show_movie))
                    .merge(gated(&state, MOVIES_WRITE, patch(movies::update_movie)))
                    .merge(gated(&state, MOVIES_WRITE, delete(movies::delete_movie))),
            ),
        )
        .route("/v1/users", allow(post(auth::register_user)))
        .route("/v1/users/activated", allow(put(auth::activate_user)))
        .route(
            "/v1/tokens/authentication",
            allow(post(auth::create_authentication_token)),
        )
        .route("/debug/vars", allow(get(public::debug_vars)))
        .fallback(public::not_found);

    apply_middleware(router, state)
}

/// Outermost first: request span, panic recovery, metrics, CORS, rate
/// limiting, authentication. The span is outermost so a recovered panic is
/// logged with the request's method and URI. `Router::layer` wraps what is
/// already there, so the calls below run innermost first.
pub fn apply_middleware(router: Router<AppState>, state: AppState) -> Router {
    router
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), rate_limit))
        .layer(from_fn_with_state(state.clone(), enable_cors))
        .layer(from_fn_with_state(state.clone(), track_metrics))
        .layer(CatchPanicLayer::custom(recover_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::extract::Request| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %Uuid::new_v4(),
                    )
                })
                .on_response(
                    |response: &axum::response::Response,
                     latency: Duration,
                     _span: &tracing::Span| {
                        tracing::debug!(status = response.status().as_u16(), ?latency, "finished");
                    },
                ),
        )
        .with_state(state)
}

/// Wrap a method router in the authorization gates, outermost first:
/// authenticated, activated, holding `code`. The gates cover only the
/// methods registered so far.
fn gated(
    state: &AppState,
    code: &'static str,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route
        .route_layer(from_fn_with_state(state.clone(), require_permission(code)))
        .route_layer(from_fn(require_activated_user))
        .route_layer(from_fn(require_authenticated_user))
}

/// Answer unsupported methods on a known path with the JSON 405.
fn allow(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.fallback(public::method_not_allowed)
}
