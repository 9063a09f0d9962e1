//! Point value (one reading)
//!
//! A reading is either a flat point reading (`point_id` set, no children) or a
//! multi-channel parent (`multi = true`) whose channel values travel in
//! `children`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::metadata::Point;
use crate::serde_helpers::deserialize_scalar_string;
use crate::time_unit::TimeUnit;

/// Child reading embedded in a multi-channel parent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildValue {
    pub point_id: u64,
    #[serde(default, deserialize_with = "deserialize_scalar_string")]
    pub value: String,
    #[serde(default, deserialize_with = "deserialize_scalar_string")]
    pub raw_value: String,
}

impl ChildValue {
    pub fn new(point_id: u64, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            point_id,
            raw_value: value.clone(),
            value,
        }
    }
}

/// One timestamped reading from a device channel
///
/// Timestamps travel as epoch milliseconds on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PointValue {
    pub device_id: u64,

    /// Absent when the record is a multi-channel parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_id: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_scalar_string")]
    pub value: String,

    #[serde(default, deserialize_with = "deserialize_scalar_string")]
    pub raw_value: String,

    #[serde(default)]
    pub multi: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildValue>,

    /// Device/adapter timestamp, the ordering key of all history queries
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub origin_time: DateTime<Utc>,

    /// Arrival time, stamped once at ingestion
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub create_time: Option<DateTime<Utc>>,

    // Transient cache directives, stripped before any read returns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_out: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<TimeUnit>,

    // Point metadata copied in at query time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rw: Option<u8>,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub point_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl PointValue {
    /// Create a flat point reading
    pub fn new(
        device_id: u64,
        point_id: u64,
        value: impl Into<String>,
        origin_time: DateTime<Utc>,
    ) -> Self {
        let value = value.into();
        Self {
            device_id,
            point_id: Some(point_id),
            raw_value: value.clone(),
            value,
            origin_time,
            ..Default::default()
        }
    }

    /// Create a multi-channel parent reading
    pub fn multi(device_id: u64, children: Vec<ChildValue>, origin_time: DateTime<Utc>) -> Self {
        Self {
            device_id,
            multi: true,
            children,
            origin_time,
            ..Default::default()
        }
    }

    /// Attach a cache lifetime to the reading
    pub fn with_ttl(mut self, time_out: i64, time_unit: TimeUnit) -> Self {
        self.time_out = Some(time_out);
        self.time_unit = Some(time_unit);
        self
    }

    /// Cache lifetime requested by the reading itself
    ///
    /// `None` when either field is missing or the amount is not positive.
    pub fn cache_ttl(&self) -> Option<Duration> {
        match (self.time_out, self.time_unit) {
            (Some(amount), Some(unit)) => unit.to_duration(amount),
            _ => None,
        }
    }

    /// Drop the transient cache directives
    pub fn strip_transient(mut self) -> Self {
        self.time_out = None;
        self.time_unit = None;
        self
    }

    /// Copy channel metadata from the point definition
    pub fn decorate(mut self, point: &Point) -> Self {
        self.rw = point.rw;
        self.point_type = point.point_type.clone();
        self.unit = point.unit.clone();
        self
    }

    /// True when the parent itself or any child carries `point_id`
    pub fn references_point(&self, point_id: u64) -> bool {
        self.point_id == Some(point_id) || self.has_child_point(point_id)
    }

    /// True when some child carries `point_id`
    pub fn has_child_point(&self, point_id: u64) -> bool {
        self.children.iter().any(|c| c.point_id == point_id)
    }
}
