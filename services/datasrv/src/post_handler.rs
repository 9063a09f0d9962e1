//! Post-processing hook run on every ingested batch
//!
//! Deployments plug in forwarding, alarm evaluation and similar side effects
//! here. The hook sees the stamped batch and runs independently of the
//! store and cache writes.

use async_trait::async_trait;
use errors::DataResult;
use point_model::PointValue;

#[async_trait]
pub trait PostHandler: Send + Sync + 'static {
    async fn post_handle(&self, values: &[PointValue]) -> DataResult<()>;
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPostHandler;

#[async_trait]
impl PostHandler for NoopPostHandler {
    async fn post_handle(&self, _values: &[PointValue]) -> DataResult<()> {
        Ok(())
    }
}
