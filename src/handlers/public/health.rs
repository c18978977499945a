// handlers/public/health.rs - GET /v1/healthcheck handler

use axum::extract::State;
use serde::Serialize;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub system_info: SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub environment: &'static str,
    pub version: &'static str,
}

/// Liveness only; the database is not consulted.
pub async fn healthcheck(State(state): State<AppState>) -> ApiResult<Health> {
    Ok(ApiResponse::success(Health {
        status: "available",
        system_info: SystemInfo {
            environment: state.config.environment.as_str(),
            version: env!("CARGO_PKG_VERSION"),
        },
    }))
}
