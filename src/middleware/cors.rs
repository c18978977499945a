use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

const PREFLIGHT_METHODS: &str = "OPTIONS, PUT, PATCH, DELETE";
const PREFLIGHT_HEADERS: &str = "Authorization, Content-Type";

/// Reflects the request's `Origin` when it exactly matches a trusted origin,
/// and answers trusted preflight requests directly.
pub async fn enable_cors(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let trusted = request
        .headers()
        .get(header::ORIGIN)
        .filter(|origin| {
            state
                .config
                .cors
                .trusted_origins
                .iter()
                .any(|t| origin.as_bytes() == t.as_bytes())
        })
        .cloned();

    let preflight = trusted.is_some()
        && request.method() == Method::OPTIONS
        && request
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = if preflight {
        let mut response = StatusCode::OK.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(PREFLIGHT_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(PREFLIGHT_HEADERS),
        );
        response
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    add_vary(headers);
    if let Some(origin) = trusted {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }

    response
}

fn add_vary(headers: &mut HeaderMap) {
    headers.append(header::VARY, HeaderValue::from_static("Origin"));
    headers.append(
        header::VARY,
        HeaderValue::from_static("Access-Control-Request-Method"),
    );
}
