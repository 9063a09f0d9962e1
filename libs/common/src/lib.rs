//! Shared service plumbing
//!
//! Provides the pieces every service binary needs:
//! - Redis client over a bb8 pool
//! - logging initialization
//! - API response envelopes
//! - graceful shutdown signal

#[cfg(feature = "redis")]
pub mod redis;

pub mod api_types;
pub mod logging;
pub mod shutdown;

pub use api_types::{
    ComponentHealth, ErrorInfo, ErrorResponse, HealthResponse, HealthStatus, SuccessResponse,
};

#[cfg(feature = "axum")]
pub use api_types::AppError;

pub use logging::{init_logging, LoggingConfig};
pub use shutdown::{wait_for_shutdown, ShutdownSignal};

// Pre-import common types
pub mod prelude {
    #[cfg(feature = "redis")]
    pub use crate::redis::{RedisClient, RedisConfig};
}
