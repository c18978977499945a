mod common;

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use common::{body_json, build, lazy_pool, test_config, TestApp};
use reelbase::routes::apply_middleware;
use reelbase::state::AppState;

fn vary_values(res: &axum::http::Response<Body>) -> Vec<String> {
    res.headers()
        .get_all(header::VARY)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn trusted_origin_is_reflected() -> Result<()> {
    let app = TestApp::offline();

    let req = Request::get("/v1/healthcheck")
        .header(header::ORIGIN, "https://trusted.example")
        .body(Body::empty())?;
    let res = app.send(req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://trusted.example"
    );
    let vary = vary_values(&res);
    for expected in ["Origin", "Access-Control-Request-Method", "Authorization"] {
        assert!(vary.iter().any(|v| v == expected), "missing Vary {}", expected);
    }
    Ok(())
}

#[tokio::test]
async fn untrusted_origin_gets_no_cors_headers() -> Result<()> {
    let app = TestApp::offline();

    let req = Request::get("/v1/healthcheck")
        .header(header::ORIGIN, "https://evil.example")
        .body(Body::empty())?;
    let res = app.send(req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    assert!(vary_values(&res).iter().any(|v| v == "Origin"));
    Ok(())
}

#[tokio::test]
async fn trusted_preflight_short_circuits() -> Result<()> {
    let app = TestApp::offline();

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/v1/movies/1")
        .header(header::ORIGIN, "https://trusted.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())?;
    let res = app.send(req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://trusted.example"
    );
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
        "OPTIONS, PUT, PATCH, DELETE"
    );
    assert_eq!(
        res.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Authorization, Content-Type"
    );
    Ok(())
}

#[tokio::test]
async fn untrusted_preflight_falls_through_to_routing() -> Result<()> {
    let app = TestApp::offline();

    let req = Request::builder()
        .method("OPTIONS")
        .uri("/v1/movies/1")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
        .body(Body::empty())?;
    let res = app.send(req).await;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(res.headers().get(header::ACCESS_CONTROL_ALLOW_METHODS).is_none());
    Ok(())
}

#[tokio::test]
async fn fifth_request_in_a_burst_is_rate_limited() -> Result<()> {
    let mut config = test_config();
    config.limiter.enabled = true;
    config.limiter.rps = 2.0;
    config.limiter.burst = 4;
    let app = TestApp::new(config, lazy_pool());

    for _ in 0..4 {
        let res = app.get("/v1/healthcheck", None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = app.get("/v1/healthcheck", None).await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_json(res).await, json!({ "error": "rate limit exceeded" }));
    Ok(())
}

#[tokio::test]
async fn disabled_limiter_never_refuses() -> Result<()> {
    let app = TestApp::offline();
    for _ in 0..10 {
        assert_eq!(app.get("/v1/healthcheck", None).await.status(), StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn missing_client_address_is_a_server_error() -> Result<()> {
    let mut config = test_config();
    config.limiter.enabled = true;
    let app = TestApp::new(config, lazy_pool());

    // Bypass `TestApp::send`, which supplies the client address.
    let res = app
        .router
        .clone()
        .oneshot(build("GET", "/v1/healthcheck", None, None))
        .await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(res).await,
        json!({ "error": "the server encountered a problem and could not process your request" })
    );
    Ok(())
}

#[tokio::test]
async fn malformed_authorization_header_is_rejected() -> Result<()> {
    let app = TestApp::offline();

    for value in ["Token abc", "Bearer", "Bearer too-short"] {
        let req = Request::get("/v1/healthcheck")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())?;
        let res = app.send(req).await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", value);
        assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
        assert!(vary_values(&res).iter().any(|v| v == "Authorization"));
        assert_eq!(
            body_json(res).await,
            json!({ "error": "invalid or missing authentication token" })
        );
    }
    Ok(())
}

#[tokio::test]
async fn empty_authorization_header_is_anonymous() -> Result<()> {
    let app = TestApp::offline();

    let req = Request::get("/v1/healthcheck")
        .header(header::AUTHORIZATION, "")
        .body(Body::empty())?;
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::WWW_AUTHENTICATE).is_none());
    assert!(vary_values(&res).iter().any(|v| v == "Authorization"));

    let req = Request::get("/v1/movies")
        .header(header::AUTHORIZATION, "")
        .body(Body::empty())?;
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(res).await,
        json!({ "error": "you must be authenticated to access this resource" })
    );
    Ok(())
}

#[tokio::test]
async fn anonymous_users_cannot_reach_movies() -> Result<()> {
    let app = TestApp::offline();

    let res = app.get("/v1/movies", None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(res).await,
        json!({ "error": "you must be authenticated to access this resource" })
    );

    let res = app
        .json("POST", "/v1/movies", None, json!({ "title": "Moana" }))
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

async fn boom() -> &'static str {
    panic!("handler exploded")
}

fn panicking_app() -> Router {
    let state = AppState::new(
        test_config(),
        lazy_pool(),
        Arc::new(reelbase::mailer::MemoryMailer::new()),
    );
    let router = Router::new().route("/boom", get(boom));
    apply_middleware(router, state)
}

#[tokio::test]
async fn panics_become_500_and_close_the_connection() -> Result<()> {
    let mut req = build("GET", "/boom", None, None);
    req.extensions_mut().insert(axum::extract::ConnectInfo(
        std::net::SocketAddr::from(common::CLIENT_ADDR),
    ));

    let res = panicking_app().oneshot(req).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.headers()[header::CONNECTION], "close");
    assert_eq!(
        body_json(res).await,
        json!({ "error": "the server encountered a problem and could not process your request" })
    );
    Ok(())
}

/// Log sink shared between the test and the subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn recovered_panics_are_logged_with_method_and_uri() -> Result<()> {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let mut req = build("GET", "/boom", None, None);
    req.extensions_mut().insert(axum::extract::ConnectInfo(
        std::net::SocketAddr::from(common::CLIENT_ADDR),
    ));
    let res = panicking_app().oneshot(req).await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let output = String::from_utf8(logs.0.lock().unwrap().clone())?;
    let line = output
        .lines()
        .find(|line| line.contains("panic while handling request"))
        .expect("panic was logged");
    assert!(line.contains("handler exploded"), "{}", line);
    assert!(line.contains("method=GET"), "{}", line);
    assert!(line.contains("uri=/boom"), "{}", line);
    Ok(())
}
