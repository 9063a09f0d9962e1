//! Ingestion API Handlers
//!
//! Readings are stamped and fanned out before the response is written; the
//! response never waits for the store, cache or hook.

use axum::{extract::State, http::StatusCode, response::Json};
use point_model::PointValue;
use serde::Serialize;
use std::sync::Arc;

use crate::app_state::AppState;
use common::SuccessResponse;

#[derive(Debug, Serialize)]
pub struct Accepted {
    pub accepted: usize,
}

/// Accept one reading
///
/// @route POST /api/v1/point_values
/// @input Json(value): PointValue
/// @status 202 - Scheduled
pub async fn ingest_one(
    State(state): State<Arc<AppState>>,
    Json(value): Json<PointValue>,
) -> (StatusCode, Json<SuccessResponse<Accepted>>) {
    state.dispatcher.ingest(value);
    (
        StatusCode::ACCEPTED,
        Json(SuccessResponse::new(Accepted { accepted: 1 })),
    )
}

/// Accept an ordered batch
///
/// @route POST /api/v1/point_values/batch
/// @input Json(values): Vec<PointValue>
/// @status 202 - Scheduled (also for an empty batch)
pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    Json(values): Json<Vec<PointValue>>,
) -> (StatusCode, Json<SuccessResponse<Accepted>>) {
    let accepted = values.len();
    state.dispatcher.ingest_batch(values);
    (
        StatusCode::ACCEPTED,
        Json(SuccessResponse::new(Accepted { accepted })),
    )
}
