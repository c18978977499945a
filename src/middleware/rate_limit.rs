use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::LimiterConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// How often idle clients are swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Clients unseen for longer than this are forgotten.
pub const CLIENT_IDLE_TTL: Duration = Duration::from_secs(180);

#[derive(Debug)]
struct Client {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

/// Per-IP token bucket. Each client starts with `burst` tokens which refill
/// at `rps` per second up to `burst`; a request spends one token.
#[derive(Debug)]
pub struct RateLimiter {
    rps: f64,
    burst: f64,
    enabled: bool,
    clients: Mutex<HashMap<IpAddr, Client>>,
}

impl RateLimiter {
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            rps: config.rps,
            burst: f64::from(config.burst),
            enabled: config.enabled,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Spend a token for `ip`, returning false when its bucket is empty.
    pub fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        let client = clients.entry(ip).or_insert_with(|| Client {
            tokens: self.burst,
            last_refill: now,
            last_seen: now,
        });

        let elapsed = now.duration_since(client.last_refill).as_secs_f64();
        client.tokens = (client.tokens + elapsed * self.rps).min(self.burst);
        client.last_refill = now;
        client.last_seen = now;

        if client.tokens >= 1.0 {
            client.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Drop clients idle for longer than `idle`. Returns how many were removed.
    pub fn sweep(&self, idle: Duration) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, client| now.duration_since(client.last_seen) <= idle);
        before - clients.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sweep idle clients every `SWEEP_INTERVAL` for the life of the process.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.sweep(CLIENT_IDLE_TTL);
                if removed > 0 {
                    tracing::debug!(removed, "swept idle rate limiter clients");
                }
            }
        })
    }
}

/// Rejects requests from clients that have exhausted their bucket.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.limiter.enabled() {
        return Ok(next.run(request).await);
    }

    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .ok_or_else(|| ApiError::server_error("client address missing from request"))?;

    if !state.limiter.allow(ip) {
        return Err(ApiError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
