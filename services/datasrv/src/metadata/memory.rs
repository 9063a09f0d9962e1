//! In-process metadata registry for tests and embedded deployments

use super::MetadataLookup;
use async_trait::async_trait;
use errors::{DataError, DataResult};
use parking_lot::RwLock;
use point_model::{Device, Point};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryMetadata {
    devices: RwLock<BTreeMap<u64, Device>>,
    points: RwLock<BTreeMap<u64, Point>>,
}

impl MemoryMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_device(&self, device: Device) {
        self.devices.write().insert(device.id, device);
    }

    pub fn insert_point(&self, point: Point) {
        self.points.write().insert(point.id, point);
    }

    /// Builder-style registration used by tests
    pub fn with_device(self, device: Device, points: impl IntoIterator<Item = Point>) -> Self {
        self.insert_device(device);
        for point in points {
            self.insert_point(point);
        }
        self
    }
}

#[async_trait]
impl MetadataLookup for MemoryMetadata {
    async fn get_device(&self, device_id: u64) -> DataResult<Device> {
        self.devices
            .read()
            .get(&device_id)
            .cloned()
            .ok_or_else(|| DataError::not_found(format!("device {}", device_id)))
    }

    async fn get_points_by_device(&self, device_id: u64) -> DataResult<Vec<Point>> {
        Ok(self
            .points
            .read()
            .values()
            .filter(|p| p.device_id == device_id)
            .cloned()
            .collect())
    }

    async fn get_point(&self, point_id: u64) -> DataResult<Point> {
        self.points
            .read()
            .get(&point_id)
            .cloned()
            .ok_or_else(|| DataError::not_found(format!("point {}", point_id)))
    }
}
