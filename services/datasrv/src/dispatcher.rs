//! Ingestion fan-out
//!
//! Each call stamps `create_time` once for the whole batch, then submits
//! three independent units to the worker pool:
//! 1. the post-processing hook with the whole batch
//! 2. one durable insert of the whole batch
//! 3. one cache unit writing every reading under its own key
//!
//! The call returns as soon as the units are queued. A failing unit is logged
//! and never cancels, delays or retries the other two. Inside the cache unit
//! every reading is written on its own, so one failed or panicking write does
//! not skip the rest of the batch.

use crate::post_handler::PostHandler;
use crate::store::PointValueStore;
use crate::worker_pool::WorkerPool;
use errors::DataError;
use futures::FutureExt;
use point_model::PointValue;
use point_rtdb::{PointValueCache, SystemTimeProvider, TimeProvider};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info_span};

#[derive(Clone)]
pub struct Dispatcher {
    pool: WorkerPool,
    store: Arc<dyn PointValueStore>,
    cache: PointValueCache,
    post_handler: Arc<dyn PostHandler>,
    clock: Arc<dyn TimeProvider>,
}

impl Dispatcher {
    pub fn new(
        pool: WorkerPool,
        store: Arc<dyn PointValueStore>,
        cache: PointValueCache,
        post_handler: Arc<dyn PostHandler>,
    ) -> Self {
        Self {
            pool,
            store,
            cache,
            post_handler,
            clock: Arc::new(SystemTimeProvider),
        }
    }

    /// Replace the clock used for `create_time`
    pub fn with_clock(mut self, clock: Arc<dyn TimeProvider>) -> Self {
        self.clock = clock;
        self
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Accept one reading
    pub fn ingest(&self, value: PointValue) {
        self.ingest_batch(vec![value]);
    }

    /// Accept an ordered batch; an empty batch schedules nothing
    pub fn ingest_batch(&self, mut values: Vec<PointValue>) {
        if values.is_empty() {
            return;
        }

        let now = self.clock.now();
        for value in &mut values {
            value.create_time = Some(now);
        }
        let batch: Arc<[PointValue]> = values.into();

        let span = info_span!("ingest", size = batch.len(), device_id = batch[0].device_id);
        let _entered = span.enter();

        let hook = Arc::clone(&self.post_handler);
        let values = Arc::clone(&batch);
        self.pool
            .submit("post_handle", async move { hook.post_handle(&values).await });

        let store = Arc::clone(&self.store);
        let values = Arc::clone(&batch);
        self.pool
            .submit("store_insert", async move { store.insert_many(&values).await });

        let cache = self.cache.clone();
        let values = batch;
        self.pool.submit("cache_write", async move {
            let mut failed = 0usize;
            for value in values.iter() {
                match AssertUnwindSafe(cache.write(value)).catch_unwind().await {
                    Ok(Ok(())) => {},
                    Ok(Err(e)) => {
                        failed += 1;
                        error!(
                            "Failed to cache point value of device {} point {:?}: {}",
                            value.device_id, value.point_id, e
                        );
                    },
                    Err(_) => {
                        failed += 1;
                        error!(
                            "Cache write panicked for device {} point {:?}",
                            value.device_id, value.point_id
                        );
                    },
                }
            }
            if failed > 0 {
                return Err(DataError::unavailable(
                    "cache",
                    format!("{} of {} writes failed", failed, values.len()),
                ));
            }
            debug!("Cached {} point values", values.len());
            Ok(())
        });
    }
}
