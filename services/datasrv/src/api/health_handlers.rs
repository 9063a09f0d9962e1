//! Health Check API Handler

use axum::{extract::State, response::Json};
use std::collections::HashMap;
use std::sync::Arc;

use crate::app_state::AppState;
use crate::store::PointValueStore;
use common::{ComponentHealth, HealthResponse, SuccessResponse};
use point_rtdb::HotCache;

/// Probe the store and the cache
///
/// Always answers 200; an unreachable backend shows as `degraded` because
/// ingestion keeps running with the remaining sinks.
///
/// @route GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<SuccessResponse<HealthResponse>> {
    let mut checks = HashMap::new();

    let store = match state.store.ping().await {
        Ok(()) => ComponentHealth::healthy(),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    };
    checks.insert("store".to_string(), store);

    let cache = match state.cache.backend().ping().await {
        Ok(()) => ComponentHealth::healthy(),
        Err(e) => ComponentHealth::unhealthy(e.to_string()),
    };
    checks.insert("cache".to_string(), cache);

    let health = HealthResponse::from_checks(
        state.config.service.name.clone(),
        env!("CARGO_PKG_VERSION"),
        state.uptime_secs(),
        checks,
    );
    Json(
        SuccessResponse::new(health)
            .with_metadata("in_flight", state.pool.in_flight().into()),
    )
}
