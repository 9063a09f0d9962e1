//! Durable time-series store for point values
//!
//! Append-only: readings are inserted once and never updated or deleted here.
//! Every query returns readings newest-first by `origin_time`; readings with
//! the same `origin_time` come back in reverse insertion order.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::criteria::Criteria;
use async_trait::async_trait;
use errors::DataResult;
use point_model::{PageParams, PointValue};

/// Slice of a sorted result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

impl Window {
    pub fn first() -> Self {
        Self { skip: 0, limit: 1 }
    }
}

impl From<&PageParams> for Window {
    fn from(page: &PageParams) -> Self {
        Self {
            skip: page.skip(),
            limit: page.limit(),
        }
    }
}

#[async_trait]
pub trait PointValueStore: Send + Sync + 'static {
    /// Append readings, preserving batch order
    async fn insert_many(&self, values: &[PointValue]) -> DataResult<()>;

    /// Matching readings, newest first, sliced by `window`
    async fn find(&self, criteria: &Criteria, window: Window) -> DataResult<Vec<PointValue>>;

    /// Number of matching readings
    async fn count(&self, criteria: &Criteria) -> DataResult<u64>;

    /// Newest matching reading
    async fn find_one(&self, criteria: &Criteria) -> DataResult<Option<PointValue>> {
        Ok(self.find(criteria, Window::first()).await?.into_iter().next())
    }

    /// Liveness probe used by health checks
    async fn ping(&self) -> DataResult<()> {
        Ok(())
    }
}

/// Shape of a reading as persisted: no cache directives, no channel metadata
pub(crate) fn persisted_form(value: &PointValue) -> PointValue {
    let mut stored = value.clone().strip_transient();
    stored.rw = None;
    stored.point_type = None;
    stored.unit = None;
    stored
}
