//! Read-only projections of device and point metadata
//!
//! These records are owned by the manager service; the data service only
//! consumes them through lookups.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Device {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Multi-channel devices report one parent reading with child values
    #[serde(default)]
    pub multi: bool,
}

impl Device {
    pub fn new(id: u64, multi: bool) -> Self {
        Self {
            id,
            name: None,
            multi,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub id: u64,
    pub device_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// 0 = read, 1 = write, 2 = read/write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rw: Option<u8>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub point_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Point {
    pub fn new(id: u64, device_id: u64) -> Self {
        Self {
            id,
            device_id,
            ..Default::default()
        }
    }
}
