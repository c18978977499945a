// handlers/public/debug.rs - GET /debug/vars handler

use axum::extract::State;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult, MetricsSnapshot};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DebugVars {
    pub version: &'static str,
    /// Unix seconds at the time of the request.
    pub timestamp: i64,
    pub database: PoolStats,
    pub background_tasks: usize,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct PoolStats {
    pub size: u32,
    pub idle: usize,
}

/// Live process counters.
pub async fn debug_vars(State(state): State<AppState>) -> ApiResult<DebugVars> {
    Ok(ApiResponse::success(DebugVars {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        database: PoolStats {
            size: state.pool.size(),
            idle: state.pool.num_idle(),
        },
        background_tasks: state.tasks.len(),
        metrics: state.metrics.snapshot(),
    }))
}
