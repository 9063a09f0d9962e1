//! Hot cache for the latest point values
//!
//! # Key Components
//!
//! - **HotCache trait**: key-value store with per-key expiry
//! - **CacheKeySpace**: `"<prefix><device>.<point|*>"` key naming
//! - **PointValueCache**: typed JSON access on top of any backend
//! - **TimeProvider**: injectable clock

pub mod traits;

#[cfg(feature = "redis-backend")]
pub mod redis_impl;

pub mod memory_impl;

pub mod keyspace;

pub mod point_cache;

pub mod time;

// Re-exports
pub use bytes::Bytes;
pub use traits::HotCache;

pub use keyspace::{CacheKeySpace, WILDCARD};

#[cfg(feature = "redis-backend")]
pub use redis_impl::RedisCache;

pub use memory_impl::MemoryCache;

pub use point_cache::PointValueCache;

pub use time::{FixedTimeProvider, SystemTimeProvider, TimeProvider};

/// Helper functions for tests and embedded use
pub mod helpers {
    use super::{CacheKeySpace, MemoryCache, PointValueCache};
    use std::sync::Arc;

    /// Typed cache over a fresh in-memory backend in the test keyspace
    pub fn create_test_point_cache() -> (Arc<MemoryCache>, PointValueCache) {
        let backend = Arc::new(MemoryCache::new());
        let cache = PointValueCache::new(backend.clone(), CacheKeySpace::test());
        (backend, cache)
    }
}
