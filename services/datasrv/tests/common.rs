//! Shared test scaffolding: in-memory backends plus instrumented doubles

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use datasrv::bootstrap::{self, Backends};
use datasrv::{AppState, Criteria, DatasrvConfig, MemoryMetadata, MemoryStore, PointValueStore, PostHandler, Window};
use errors::{DataError, DataResult};
use parking_lot::Mutex;
use point_model::{Device, Point, PointValue};
use point_rtdb::{HotCache, MemoryCache};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn ts(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// Device 1 is single-channel with points 10 and 11; device 2 is
/// multi-channel with points 20 and 21
pub fn fixture_metadata() -> Arc<MemoryMetadata> {
    let mut voltage = Point::new(10, 1);
    voltage.unit = Some("V".to_string());
    voltage.rw = Some(0);
    Arc::new(
        MemoryMetadata::new()
            .with_device(Device::new(1, false), [voltage, Point::new(11, 1)])
            .with_device(Device::new(2, true), [Point::new(20, 2), Point::new(21, 2)]),
    )
}

// ============================================================================
// Instrumented doubles
// ============================================================================

/// Records every batch handed to the hook
#[derive(Default)]
pub struct RecordingPostHandler {
    pub batches: Mutex<Vec<Vec<PointValue>>>,
    pub fail: bool,
}

#[async_trait]
impl PostHandler for RecordingPostHandler {
    async fn post_handle(&self, values: &[PointValue]) -> DataResult<()> {
        self.batches.lock().push(values.to_vec());
        if self.fail {
            return Err(DataError::Internal("hook failed".into()));
        }
        Ok(())
    }
}

/// Memory cache that counts writes and can be switched to fail them,
/// either all of them or only keys ending in a given suffix
#[derive(Default)]
pub struct CountingCache {
    pub inner: MemoryCache,
    pub writes: AtomicUsize,
    pub fail: bool,
    pub fail_suffix: Option<String>,
    pub panic_suffix: Option<String>,
}

impl CountingCache {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn failing_on(suffix: &str) -> Self {
        Self {
            fail_suffix: Some(suffix.to_string()),
            ..Default::default()
        }
    }

    pub fn panicking_on(suffix: &str) -> Self {
        Self {
            panic_suffix: Some(suffix.to_string()),
            ..Default::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HotCache for CountingCache {
    async fn get(&self, key: &str) -> DataResult<Option<Bytes>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> DataResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let matches = |suffix: &Option<String>| suffix.as_deref().is_some_and(|s| key.ends_with(s));
        if matches(&self.panic_suffix) {
            panic!("cache backend crashed on {}", key);
        }
        if self.fail || matches(&self.fail_suffix) {
            return Err(DataError::unavailable("redis", "connection refused"));
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get_many(&self, keys: &[String]) -> DataResult<Vec<Option<Bytes>>> {
        self.inner.get_many(keys).await
    }
}

/// Memory store that records insert calls; inserts or reads can be
/// switched to fail
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub insert_sizes: Mutex<Vec<usize>>,
    pub fail: bool,
    pub fail_reads: bool,
}

impl CountingStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn insert_sizes(&self) -> Vec<usize> {
        self.insert_sizes.lock().clone()
    }
}

#[async_trait]
impl PointValueStore for CountingStore {
    async fn insert_many(&self, values: &[PointValue]) -> DataResult<()> {
        self.insert_sizes.lock().push(values.len());
        if self.fail {
            return Err(DataError::unavailable("sqlite", "database is locked"));
        }
        self.inner.insert_many(values).await
    }

    async fn find(&self, criteria: &Criteria, window: Window) -> DataResult<Vec<PointValue>> {
        if self.fail_reads {
            return Err(DataError::unavailable("sqlite", "disk I/O error"));
        }
        self.inner.find(criteria, window).await
    }

    async fn count(&self, criteria: &Criteria) -> DataResult<u64> {
        if self.fail_reads {
            return Err(DataError::unavailable("sqlite", "disk I/O error"));
        }
        self.inner.count(criteria).await
    }
}

// ============================================================================
// Assembled service
// ============================================================================

pub struct TestEnv {
    pub state: Arc<AppState>,
    pub store: Arc<CountingStore>,
    pub cache: Arc<CountingCache>,
    pub hook: Arc<RecordingPostHandler>,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with(
            CountingStore::default(),
            CountingCache::default(),
            RecordingPostHandler::default(),
            DatasrvConfig::in_memory(),
        )
    }

    pub fn with(
        store: CountingStore,
        cache: CountingCache,
        hook: RecordingPostHandler,
        config: DatasrvConfig,
    ) -> Self {
        let store = Arc::new(store);
        let cache = Arc::new(cache);
        let hook = Arc::new(hook);
        let backends = Backends {
            store: store.clone(),
            cache: cache.clone(),
            metadata: fixture_metadata(),
            post_handler: hook.clone(),
        };
        let state = Arc::new(bootstrap::assemble(config, backends));
        Self {
            state,
            store,
            cache,
            hook,
        }
    }

    /// Wait until every fan-out unit scheduled so far has finished
    pub async fn settle(&self) {
        self.state.pool.quiesce().await;
    }
}
