//! Admin API Handlers
//!
//! Runtime log level control.

use axum::response::Json;
use serde::{Deserialize, Serialize};

use common::{logging, AppError, SuccessResponse};

#[derive(Debug, Serialize, Deserialize)]
pub struct LogLevelResponse {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct SetLogLevelRequest {
    pub level: String,
}

/// @route GET /api/admin/logs/level
pub async fn get_log_level() -> Json<SuccessResponse<LogLevelResponse>> {
    Json(SuccessResponse::new(LogLevelResponse {
        level: logging::get_log_level(),
    }))
}

/// Accepts a level (`debug`) or a full filter (`info,datasrv=trace`)
///
/// @route POST /api/admin/logs/level
/// @status 400 - Unparseable filter
pub async fn set_log_level(
    Json(request): Json<SetLogLevelRequest>,
) -> Result<Json<SuccessResponse<LogLevelResponse>>, AppError> {
    logging::set_log_level(&request.level).map_err(AppError::bad_request)?;
    Ok(Json(SuccessResponse::new(LogLevelResponse {
        level: logging::get_log_level(),
    })))
}
