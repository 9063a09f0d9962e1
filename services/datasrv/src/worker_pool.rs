//! Bounded executor shared by ingestion fan-out and paged queries
//!
//! Every unit runs as its own tokio task, gated by a semaphore permit and
//! registered with a `TaskTracker` so shutdown can drain in-flight work.

use errors::{DataError, DataResult};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, Instrument, Span};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    accepting: Arc<AtomicBool>,
    /// Serializes tracker close/reopen against shutdown
    lifecycle: Arc<Mutex<()>>,
    max_concurrency: usize,
}

impl WorkerPool {
    pub fn new(max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            tracker: TaskTracker::new(),
            accepting: Arc::new(AtomicBool::new(true)),
            lifecycle: Arc::new(Mutex::new(())),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Units currently queued or running
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Run `task` on the pool and hand back its join handle
    pub fn spawn<F, T>(&self, task: F) -> DataResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if !self.is_accepting() {
            return Err(DataError::unavailable("worker pool", "shutting down"));
        }
        let semaphore = Arc::clone(&self.semaphore);
        Ok(self.tracker.spawn(async move {
            // The semaphore is never closed, so acquisition only waits
            let _permit = semaphore.acquire_owned().await.ok();
            task.await
        }))
    }

    /// Fire-and-forget unit: its error or panic is logged under `name`
    /// and never reaches the caller or any other unit
    ///
    /// The unit runs inside the caller's current span.
    pub fn submit<F>(&self, name: &'static str, task: F)
    where
        F: Future<Output = DataResult<()>> + Send + 'static,
    {
        let unit = async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => debug!("Unit {} completed", name),
                Ok(Err(e)) => error!("Unit {} failed: {}", name, e),
                Err(_) => error!("Unit {} panicked", name),
            }
        };
        let spawned = self.spawn(unit.instrument(Span::current()));
        if let Err(e) = spawned {
            error!("Unit {} rejected: {}", name, e);
        }
    }

    /// Wait for every in-flight unit without closing the pool
    pub async fn quiesce(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        // Only a pool that is still accepting may be reopened
        let _guard = self.lifecycle.lock();
        if self.is_accepting() {
            self.tracker.reopen();
        }
    }

    /// Stop accepting work and wait for in-flight units to finish
    pub async fn shutdown(&self) {
        {
            let _guard = self.lifecycle.lock();
            self.accepting.store(false, Ordering::Release);
            self.tracker.close();
        }
        info!("Draining {} in-flight units", self.tracker.len());
        self.tracker.wait().await;
        info!("Worker pool stopped");
    }
}
