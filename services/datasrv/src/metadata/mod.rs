//! Device and point metadata lookups
//!
//! Metadata is owned by the manager service; this crate only reads it.

mod http;
mod memory;

pub use http::HttpMetadataClient;
pub use memory::MemoryMetadata;

use async_trait::async_trait;
use errors::DataResult;
use point_model::{Device, Point};

/// Read-only resolution of devices and points by id
///
/// `get_device` and `get_point` return `DataError::NotFound` for unknown ids.
/// `get_points_by_device` returns an empty list for a device without points.
#[async_trait]
pub trait MetadataLookup: Send + Sync + 'static {
    async fn get_device(&self, device_id: u64) -> DataResult<Device>;

    async fn get_points_by_device(&self, device_id: u64) -> DataResult<Vec<Point>>;

    async fn get_point(&self, point_id: u64) -> DataResult<Point>;
}
