//! History query criteria and page result

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

fn default_current() -> u64 {
    1
}

fn default_size() -> u64 {
    20
}

/// Page parameters with an optional `origin_time` window (epoch ms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    /// Page number (1-indexed)
    #[serde(default = "default_current")]
    pub current: u64,
    /// Records per page
    #[serde(default = "default_size")]
    pub size: u64,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            current: default_current(),
            size: default_size(),
            start_time: 0,
            end_time: 0,
        }
    }
}

impl PageParams {
    pub fn new(current: u64, size: u64) -> Self {
        Self {
            current,
            size,
            ..Default::default()
        }
    }

    pub fn with_window(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    /// Records to fetch
    pub fn limit(&self) -> u64 {
        self.size
    }

    /// Records to skip: `size * (current - 1)`; page 0 is treated as page 1
    pub fn skip(&self) -> u64 {
        self.size.saturating_mul(self.current.max(1) - 1)
    }

    /// Inclusive window, only when `0 < start_time <= end_time`
    pub fn time_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        if self.start_time > 0 && self.end_time > 0 && self.start_time <= self.end_time {
            let start = Utc.timestamp_millis_opt(self.start_time).single()?;
            let end = Utc.timestamp_millis_opt(self.end_time).single()?;
            Some((start, end))
        } else {
            None
        }
    }

    /// Both bounds set but in the wrong order
    pub fn is_inverted(&self) -> bool {
        self.start_time > 0 && self.end_time > 0 && self.start_time > self.end_time
    }
}

/// Criteria for a paginated history query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointValueQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_id: Option<u64>,
    #[serde(default)]
    pub page: PageParams,
}

impl PointValueQuery {
    pub fn for_device(device_id: u64) -> Self {
        Self {
            device_id: Some(device_id),
            ..Default::default()
        }
    }

    pub fn for_point(point_id: u64) -> Self {
        Self {
            point_id: Some(point_id),
            ..Default::default()
        }
    }

    pub fn with_point(mut self, point_id: u64) -> Self {
        self.point_id = Some(point_id);
        self
    }

    pub fn with_page(mut self, page: PageParams) -> Self {
        self.page = page;
        self
    }
}

/// One page of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub current: u64,
    pub size: u64,
    pub total: u64,
    pub records: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(params: &PageParams, total: u64, records: Vec<T>) -> Self {
        Self {
            current: params.current,
            size: params.size,
            total,
            records,
        }
    }

    pub fn empty(params: &PageParams) -> Self {
        Self::new(params, 0, Vec::new())
    }

    /// Total number of pages
    pub fn pages(&self) -> u64 {
        if self.size == 0 {
            0
        } else {
            self.total.div_ceil(self.size)
        }
    }
}
