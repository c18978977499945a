#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tokio::sync::oneshot;
use tower::ServiceExt;

use reelbase::auth::Scope;
use reelbase::config::{AppConfig, DatabaseConfig};
use reelbase::database::models::User;
use reelbase::database::DatabaseManager;
use reelbase::mailer::MemoryMailer;
use reelbase::routes::app;
use reelbase::server::serve_with_shutdown;
use reelbase::state::AppState;

/// Address every in-process request appears to come from.
pub const CLIENT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 40000);

/// Config for tests: limiter off unless a test turns it on.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.limiter.enabled = false;
    config.cors.trusted_origins = vec!["https://trusted.example".to_string()];
    config
}

/// Pool that never connects unless a query runs. For tests that stop before
/// the store.
pub fn lazy_pool() -> PgPool {
    let config = DatabaseConfig {
        dsn: "postgres://reelbase@127.0.0.1:1/reelbase".to_string(),
        max_open_conns: 1,
        max_idle_time: Duration::from_secs(1),
        migrate: false,
    };
    DatabaseManager::connect_lazy(&config).expect("lazy pool")
}

/// Migrated pool from `TEST_DATABASE_URL`, or `None` when it is unset.
pub async fn db_pool() -> Result<Option<PgPool>> {
    let Ok(dsn) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return Ok(None);
    };

    let config = DatabaseConfig {
        dsn,
        max_open_conns: 5,
        max_idle_time: Duration::from_secs(60),
        migrate: true,
    };
    let pool = DatabaseManager::connect(&config)
        .await
        .context("failed to connect to TEST_DATABASE_URL")?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Some(pool))
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub mailer: Arc<MemoryMailer>,
}

impl TestApp {
    pub fn new(config: AppConfig, pool: PgPool) -> Self {
        let mailer = Arc::new(MemoryMailer::new());
        let state = AppState::new(config, pool, mailer.clone());
        Self {
            router: app(state.clone()),
            state,
            mailer,
        }
    }

    /// App without a reachable database.
    pub fn offline() -> Self {
        Self::new(test_config(), lazy_pool())
    }

    /// Send one request through the full stack, as if from `CLIENT_ADDR`.
    pub async fn send(&self, mut request: Request<Body>) -> Response<Body> {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(CLIENT_ADDR)));
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(build("GET", uri, token, None)).await
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> Response<Body> {
        self.send(build(method, uri, token, Some(body.to_string()))).await
    }

    /// Wait for background work such as welcome emails.
    pub async fn drain_background(&self) {
        self.state.tasks.close();
        self.state.tasks.wait().await;
        self.state.tasks.reopen();
    }

    /// Store an activated user holding `permissions` and return a bearer
    /// token for them.
    pub async fn user_with_permissions(&self, permissions: &[&str]) -> Result<(User, String)> {
        let models = &self.state.models;

        let mut user = User::new("Test User".into(), unique_email());
        user.password.set("pa55word-long")?;
        user.activated = true;
        models.users.insert(&mut user).await?;
        models.permissions.add_for_user(user.id, permissions).await?;

        let token = models
            .tokens
            .new_token(user.id, chrono::Duration::hours(1), Scope::Authentication)
            .await?;
        Ok((user, token.plaintext))
    }
}

pub fn build(method: &str, uri: &str, token: Option<&str>, body: Option<String>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

pub fn unique_email() -> String {
    format!("user-{}@example.com", uuid::Uuid::new_v4())
}

/// A real server on a free port, stopped when `shutdown` is sent.
pub struct TestServer {
    pub base_url: String,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    handle: tokio::task::JoinHandle<Result<(), reelbase::server::ServerError>>,
}

impl TestServer {
    pub async fn spawn(config: AppConfig, pool: PgPool) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(config, pool, Arc::new(MemoryMailer::new()));
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve_with_shutdown(listener, state.clone(), async move {
            let _ = rx.await;
        }));

        let server = Self {
            base_url,
            state,
            shutdown: Some(tx),
            handle,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = std::time::Instant::now() + timeout;
        while std::time::Instant::now() < deadline {
            let url = format!("{}/v1/healthcheck", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Signal shutdown and wait for the server to finish draining.
    pub async fn stop(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await??;
        Ok(())
    }
}
