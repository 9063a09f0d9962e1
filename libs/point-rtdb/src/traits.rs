//! Trait definitions for the hot cache abstraction

use async_trait::async_trait;
use bytes::Bytes;
use errors::DataResult;
use std::time::Duration;

/// Key-value store with per-key expiry
///
/// Holds only the most recent value per key; history lives elsewhere.
/// Single-key writes are atomic in every backend, nothing else is promised.
///
/// Implementations:
/// - `RedisCache`: production Redis backend
/// - `MemoryCache`: in-memory backend for tests and embedded use
#[async_trait]
pub trait HotCache: Send + Sync + 'static {
    /// Get value by key; expired entries read as absent
    async fn get(&self, key: &str) -> DataResult<Option<Bytes>>;

    /// Set value for key
    ///
    /// `ttl = None` stores the entry without expiry.
    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> DataResult<()>;

    /// Bulk get; the result has one slot per requested key, in order
    async fn get_many(&self, keys: &[String]) -> DataResult<Vec<Option<Bytes>>>;

    /// Liveness probe used by health checks
    async fn ping(&self) -> DataResult<()> {
        Ok(())
    }
}
