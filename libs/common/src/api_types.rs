//! Shared API models
//!
//! Every endpoint answers with either a `SuccessResponse` or an
//! `ErrorResponse` envelope so clients can branch on `success`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use errors::ErrorInfo;

fn bool_true() -> bool {
    true
}

fn bool_false() -> bool {
    false
}

// ============================================================================
// Standard API Response Models
// ============================================================================

/// Standard success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    /// Success indicator (always true)
    #[serde(default = "bool_true")]
    pub success: bool,
    /// Response data
    pub data: T,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<T> SuccessResponse<T> {
    /// Create a new success response
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the response
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Success indicator (always false for errors)
    #[serde(default = "bool_false")]
    pub success: bool,
    /// Error information
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(error: ErrorInfo) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

/// Health status of the service or one of its dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health of one dependency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}

/// Health check body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub checks: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Overall status derived from component checks
    ///
    /// Any unhealthy component degrades the service; the service itself keeps
    /// accepting writes because every write branch is isolated.
    pub fn from_checks(
        service: impl Into<String>,
        version: impl Into<String>,
        uptime_secs: u64,
        checks: HashMap<String, ComponentHealth>,
    ) -> Self {
        let status = if checks
            .values()
            .all(|c| c.status == HealthStatus::Healthy)
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            service: service.into(),
            version: version.into(),
            uptime_secs,
            checks,
        }
    }
}

// ============================================================================
// AppError - HTTP Error with proper status codes (requires axum feature)
// ============================================================================

#[cfg(feature = "axum")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// Application error with HTTP status code
///
/// Implements `IntoResponse` so handlers can return `Result<_, AppError>`.
#[cfg(feature = "axum")]
#[derive(Debug, Clone)]
pub struct AppError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error information
    pub error: ErrorInfo,
}

#[cfg(feature = "axum")]
impl AppError {
    /// 400 with the given message, for input rejected before reaching the engine
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ErrorInfo::new(message).with_code(StatusCode::BAD_REQUEST.as_u16()),
        }
    }
}

#[cfg(feature = "axum")]
impl From<errors::DataError> for AppError {
    fn from(err: errors::DataError) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match err.log_level() {
            tracing::Level::ERROR => tracing::error!("Request failed: {}", err),
            tracing::Level::WARN => tracing::warn!("Request failed: {}", err),
            _ => tracing::debug!("Request failed: {}", err),
        }
        Self {
            status,
            error: err.to_error_info(),
        }
    }
}

#[cfg(feature = "axum")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.error))).into_response()
    }
}
