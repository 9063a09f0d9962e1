//! Unified error handling for the point-value data service
//!
//! Every library in the workspace reports failures through [`DataError`].
//! The variants follow the read/write propagation rules of the service:
//! missing metadata is `NotFound`, an unreachable cache/store/metadata
//! service is `DependencyUnavailable`, malformed criteria are `Validation`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ErrorInfo - API error response type
// ============================================================================

/// Standard error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (HTTP status or custom)
    pub code: u16,
    /// Error message
    pub message: String,
    /// Detailed error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorInfo {
    /// Create a new ErrorInfo with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
        }
    }

    /// Set the error code
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Add details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

// ============================================================================
// DataError - Main error type
// ============================================================================

/// Main error type for the data service and its libraries
#[derive(Debug, Error)]
pub enum DataError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // ======================================
    // Lookup Errors
    // ======================================
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // ======================================
    // Dependency Errors (cache, durable store, metadata service)
    // ======================================
    #[error("Dependency unavailable: {dependency}: {reason}")]
    DependencyUnavailable { dependency: String, reason: String },

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    // ======================================
    // Validation Errors
    // ======================================
    #[error("Validation failed: {0}")]
    Validation(String),

    // ======================================
    // Payload & Runtime Errors
    // ======================================
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using DataError
pub type DataResult<T> = Result<T, DataError>;

/// Error category enum - used for classification and log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    NotFound,
    Dependency,
    Timeout,
    Validation,
    Internal,
}

impl DataError {
    /// Shorthand for a missing device/point/entity
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Shorthand for an unreachable dependency
    pub fn unavailable(dependency: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DependencyUnavailable {
            dependency: dependency.into(),
            reason: reason.to_string(),
        }
    }

    /// Get error category (for classification)
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) | Self::InvalidConfig { .. } => ErrorCategory::Configuration,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::DependencyUnavailable { .. } => ErrorCategory::Dependency,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Serialization(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::Validation => 400,
            ErrorCategory::NotFound => 404,
            ErrorCategory::Dependency => 503,
            ErrorCategory::Timeout => 504,
            ErrorCategory::Configuration | ErrorCategory::Internal => 500,
        }
    }

    /// Get error code (for API, logs)
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DependencyUnavailable { .. } => "DEPENDENCY_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get log level
    pub fn log_level(&self) -> tracing::Level {
        match self.category() {
            ErrorCategory::Internal | ErrorCategory::Configuration => tracing::Level::ERROR,
            ErrorCategory::Dependency | ErrorCategory::Timeout => tracing::Level::WARN,
            ErrorCategory::Validation | ErrorCategory::NotFound => tracing::Level::INFO,
        }
    }

    /// Convert to API ErrorInfo for HTTP responses
    pub fn to_error_info(&self) -> ErrorInfo {
        let error_info = ErrorInfo::new(self.to_string()).with_code(self.status_code());
        match self {
            Self::Validation(msg) => error_info.with_details(msg.clone()),
            Self::DependencyUnavailable { dependency, .. } => {
                error_info.with_details(format!("dependency: {}", dependency))
            },
            _ => error_info,
        }
    }
}

// Conversion traits for dependency error types
impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("row"),
            other => Self::unavailable("sqlite", other),
        }
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(format!("http request: {}", err));
        }
        match err.status() {
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
                Self::not_found(err.url().map(|u| u.to_string()).unwrap_or_default())
            },
            _ => Self::unavailable("http", err),
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// Helper macros for creating errors
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::DataError::Configuration($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::DataError::Configuration(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::DataError::Validation($msg.to_string())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::DataError::Validation(format!($fmt, $($arg)*))
    };
}
