// state.rs - shared application state handed to every handler and middleware
use sqlx::PgPool;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

use crate::config::AppConfig;
use crate::database::Models;
use crate::mailer::Mailer;
use crate::middleware::{Metrics, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub models: Models,
    pub mailer: Arc<dyn Mailer>,
    pub limiter: Arc<RateLimiter>,
    pub metrics: Arc<Metrics>,
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        let limiter = Arc::new(RateLimiter::new(&config.limiter));
        Self {
            config: Arc::new(config),
            models: Models::new(pool.clone()),
            pool,
            mailer,
            limiter,
            metrics: Arc::new(Metrics::default()),
            tasks: TaskTracker::new(),
        }
    }
}
