//! Clock used to stamp arrival times
//!
//! Injected so tests can pin or step the time readings are stamped with.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

pub trait TimeProvider: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct FixedTimeProvider {
    epoch_ms: AtomicI64,
}

impl FixedTimeProvider {
    /// Start at `epoch_ms` milliseconds since the Unix epoch
    pub fn new(epoch_ms: i64) -> Self {
        Self {
            epoch_ms: AtomicI64::new(epoch_ms),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.epoch_ms
            .fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        // Out-of-range instants collapse to the epoch
        Utc.timestamp_millis_opt(self.epoch_ms.load(Ordering::SeqCst))
            .single()
            .unwrap_or_default()
    }
}
