//! Cache key naming
//!
//! Keys are `"<prefix><device_id>.<point_id>"`, with `*` standing in for the
//! point of a multi-channel parent reading.

use serde::{Deserialize, Serialize};

/// Suffix used when a reading carries no point id
pub const WILDCARD: &str = "*";

/// Keyspace configuration for the point value cache
///
/// ```
/// use point_rtdb::CacheKeySpace;
///
/// let keys = CacheKeySpace::production();
/// assert_eq!(keys.point_key(3, Some(11)), "point_value:3.11");
/// assert_eq!(keys.point_key(3, None), "point_value:3.*");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheKeySpace {
    pub prefix: String,
}

impl Default for CacheKeySpace {
    fn default() -> Self {
        Self::production()
    }
}

impl CacheKeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Production keyspace
    pub fn production() -> Self {
        Self::new("point_value:")
    }

    /// Isolated keyspace so test data never mixes with production entries
    pub fn test() -> Self {
        Self::new("test:point_value:")
    }

    /// Key of the latest reading for `(device_id, point_id)`
    pub fn point_key(&self, device_id: u64, point_id: Option<u64>) -> String {
        match point_id {
            Some(point_id) => format!("{}{}.{}", self.prefix, device_id, point_id),
            None => format!("{}{}.{}", self.prefix, device_id, WILDCARD),
        }
    }

    /// Keys for every listed point of a device, in input order
    pub fn point_keys(&self, device_id: u64, point_ids: &[u64]) -> Vec<String> {
        point_ids
            .iter()
            .map(|id| self.point_key(device_id, Some(*id)))
            .collect()
    }
}
