//! In-memory hot cache
//!
//! Uses DashMap for concurrent access. Expiry is evaluated lazily on read
//! against `tokio::time::Instant`, so tests can drive it with a paused clock.

use crate::traits::HotCache;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use errors::DataResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// In-memory cache implementation with concurrent access support
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    kv_store: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self, key: &str, now: Instant) -> Option<Bytes> {
        self.kv_store
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }
}

#[async_trait]
impl HotCache for MemoryCache {
    async fn get(&self, key: &str) -> DataResult<Option<Bytes>> {
        Ok(self.read(key, Instant::now()))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> DataResult<()> {
        // A deadline past the clock's range never arrives
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.kv_store
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> DataResult<Vec<Option<Bytes>>> {
        let now = Instant::now();
        Ok(keys.iter().map(|key| self.read(key, now)).collect())
    }
}
