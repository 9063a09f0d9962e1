//! Typed access to cached point values
//!
//! Wraps a [`HotCache`] with the key scheme and the JSON payload codec.
//! Writes keep the transient TTL directives in the payload; every read strips
//! them before handing the reading out.

use crate::keyspace::CacheKeySpace;
use crate::traits::HotCache;
use bytes::Bytes;
use errors::DataResult;
use point_model::PointValue;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct PointValueCache {
    cache: Arc<dyn HotCache>,
    keys: CacheKeySpace,
    default_ttl: Option<Duration>,
}

impl std::fmt::Debug for PointValueCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointValueCache")
            .field("keys", &self.keys)
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl PointValueCache {
    pub fn new(cache: Arc<dyn HotCache>, keys: CacheKeySpace) -> Self {
        Self {
            cache,
            keys,
            default_ttl: None,
        }
    }

    /// Expiry used when a reading does not carry its own
    pub fn with_default_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn keys(&self) -> &CacheKeySpace {
        &self.keys
    }

    pub fn backend(&self) -> &Arc<dyn HotCache> {
        &self.cache
    }

    /// Expiry applied to `value`: its own directive, then the default
    pub fn ttl_for(&self, value: &PointValue) -> Option<Duration> {
        value.cache_ttl().or(self.default_ttl)
    }

    /// Store `value` as the latest reading of its key
    pub async fn write(&self, value: &PointValue) -> DataResult<()> {
        let key = self.keys.point_key(value.device_id, value.point_id);
        let ttl = self.ttl_for(value);
        let payload = serde_json::to_vec(value)?;
        self.cache.set(&key, Bytes::from(payload), ttl).await?;
        debug!("Cached {} (ttl {:?})", key, ttl);
        Ok(())
    }

    /// Latest cached reading for one key, `None` when absent or expired
    pub async fn read(&self, device_id: u64, point_id: Option<u64>) -> DataResult<Option<PointValue>> {
        let key = self.keys.point_key(device_id, point_id);
        match self.cache.get(&key).await? {
            Some(raw) => Ok(Some(decode(&raw)?.strip_transient())),
            None => Ok(None),
        }
    }

    /// Latest cached readings for the given points of a device
    ///
    /// Absent entries are dropped. An entry that no longer decodes is logged
    /// and skipped so one bad key does not hide the rest of the device.
    pub async fn read_points(&self, device_id: u64, point_ids: &[u64]) -> DataResult<Vec<PointValue>> {
        let keys = self.keys.point_keys(device_id, point_ids);
        let raw = self.cache.get_many(&keys).await?;

        let mut values = Vec::with_capacity(raw.len());
        for (key, entry) in keys.iter().zip(raw) {
            let Some(bytes) = entry else { continue };
            match decode(&bytes) {
                Ok(value) => values.push(value.strip_transient()),
                Err(e) => warn!("Skipping undecodable cache entry {}: {}", key, e),
            }
        }
        Ok(values)
    }
}

fn decode(raw: &[u8]) -> DataResult<PointValue> {
    Ok(serde_json::from_slice(raw)?)
}
