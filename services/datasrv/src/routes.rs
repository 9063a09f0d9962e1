//! API Route Configuration

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::admin_handlers::{get_log_level, set_log_level};
use crate::api::health_handlers::health_check;
use crate::api::ingest_handlers::{ingest_batch, ingest_one};
use crate::api::query_handlers::{latest, latest_point, list, realtime, realtime_point};
use crate::app_state::AppState;

pub const API_PREFIX: &str = "/api/v1/point_values";

fn point_value_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Ingestion
        .route("/", post(ingest_one))
        .route("/batch", post(ingest_batch))
        // Cache reads
        .route("/realtime/{device_id}", get(realtime))
        .route("/realtime/{device_id}/{point_id}", get(realtime_point))
        // Store reads
        .route("/latest/{device_id}", get(latest))
        .route("/latest/{device_id}/{point_id}", get(latest_point))
        .route("/list", post(list))
}

/// Create all API routes for the data service
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/admin/logs/level",
            get(get_log_level).post(set_log_level),
        )
        .nest(API_PREFIX, point_value_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
