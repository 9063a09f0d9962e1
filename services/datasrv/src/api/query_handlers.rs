//! Query API Handlers
//!
//! Realtime reads come from the cache, latest and list from the durable
//! store. Unknown devices and points read as empty, not as 404.

use axum::{
    extract::{Path, State},
    response::Json,
};
use point_model::{Page, PointValue, PointValueQuery};
use std::sync::Arc;

use crate::app_state::AppState;
use common::{AppError, SuccessResponse};

/// @route GET /api/v1/point_values/realtime/{device_id}
pub async fn realtime(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<u64>,
) -> Result<Json<SuccessResponse<Vec<PointValue>>>, AppError> {
    let values = state.query.realtime(device_id).await?;
    Ok(Json(SuccessResponse::new(values)))
}

/// `data` is `null` when nothing is cached
///
/// @route GET /api/v1/point_values/realtime/{device_id}/{point_id}
pub async fn realtime_point(
    State(state): State<Arc<AppState>>,
    Path((device_id, point_id)): Path<(u64, u64)>,
) -> Result<Json<SuccessResponse<Option<PointValue>>>, AppError> {
    let value = state.query.realtime_point(device_id, point_id).await?;
    Ok(Json(SuccessResponse::new(value)))
}

/// @route GET /api/v1/point_values/latest/{device_id}
pub async fn latest(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<u64>,
) -> Result<Json<SuccessResponse<Vec<PointValue>>>, AppError> {
    let values = state.query.latest(device_id).await?;
    Ok(Json(SuccessResponse::new(values)))
}

/// @route GET /api/v1/point_values/latest/{device_id}/{point_id}
pub async fn latest_point(
    State(state): State<Arc<AppState>>,
    Path((device_id, point_id)): Path<(u64, u64)>,
) -> Result<Json<SuccessResponse<Option<PointValue>>>, AppError> {
    let value = state.query.latest_point(device_id, point_id).await?;
    Ok(Json(SuccessResponse::new(value)))
}

/// Paged history, newest first
///
/// @route POST /api/v1/point_values/list
/// @input Json(query): PointValueQuery
/// @status 400 - Inverted window when rejection is enabled
/// @status 503 - Store unavailable
/// @status 504 - Count/fetch deadline exceeded
pub async fn list(
    State(state): State<Arc<AppState>>,
    Json(query): Json<PointValueQuery>,
) -> Result<Json<SuccessResponse<Page<PointValue>>>, AppError> {
    let page = state.query.list(&query).await?;
    Ok(Json(SuccessResponse::new(page)))
}
