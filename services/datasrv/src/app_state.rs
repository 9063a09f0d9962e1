//! Application State
//!
//! Shared by every API handler behind an `Arc`.

use std::sync::Arc;
use std::time::Instant;

use crate::config::DatasrvConfig;
use crate::dispatcher::Dispatcher;
use crate::query::QueryEngine;
use crate::store::PointValueStore;
use crate::worker_pool::WorkerPool;
use point_rtdb::PointValueCache;

pub struct AppState {
    pub config: Arc<DatasrvConfig>,

    /// Ingestion fan-out
    pub dispatcher: Dispatcher,

    /// Realtime, latest and paged reads
    pub query: QueryEngine,

    /// Shared executor, drained on shutdown
    pub pool: WorkerPool,

    /// Backends kept for health probes
    pub store: Arc<dyn PointValueStore>,
    pub cache: PointValueCache,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<DatasrvConfig>,
        dispatcher: Dispatcher,
        query: QueryEngine,
        pool: WorkerPool,
        store: Arc<dyn PointValueStore>,
        cache: PointValueCache,
    ) -> Self {
        Self {
            config,
            dispatcher,
            query,
            pool,
            store,
            cache,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
