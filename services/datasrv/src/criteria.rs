//! Store-independent query criteria
//!
//! A [`Criteria`] is a conjunction of [`Filter`]s. Stores translate it into
//! their own query language; [`Criteria::matches`] is the reference
//! semantics used by the in-memory store.

use chrono::{DateTime, Utc};
use point_model::{Device, PageParams, PointValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    DeviceEq(u64),
    /// The reading's own `point_id`
    PointEq(u64),
    /// Some entry of `children` carries the id
    ChildPointEq(u64),
    /// Disjunction of the inner filters
    AnyOf(Vec<Filter>),
    /// Inclusive on both ends
    OriginTimeBetween(DateTime<Utc>, DateTime<Utc>),
}

impl Filter {
    pub fn matches(&self, value: &PointValue) -> bool {
        match self {
            Filter::DeviceEq(id) => value.device_id == *id,
            Filter::PointEq(id) => value.point_id == Some(*id),
            Filter::ChildPointEq(id) => value.has_child_point(*id),
            Filter::AnyOf(filters) => filters.iter().any(|f| f.matches(value)),
            Filter::OriginTimeBetween(start, end) => {
                value.origin_time >= *start && value.origin_time <= *end
            },
        }
    }

    /// Own point id or any child point id
    pub fn point_or_child(point_id: u64) -> Self {
        Filter::AnyOf(vec![
            Filter::PointEq(point_id),
            Filter::ChildPointEq(point_id),
        ])
    }
}

/// How a point id is matched against readings of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointMatch {
    /// Single-channel device: the reading's `point_id` must equal
    Flat,
    /// Multi-channel device: parent `point_id` or a child's `point_id`
    NestedChildren,
}

impl PointMatch {
    pub fn for_device(device: &Device) -> Self {
        if device.multi {
            PointMatch::NestedChildren
        } else {
            PointMatch::Flat
        }
    }

    pub fn filter(self, point_id: u64) -> Filter {
        match self {
            PointMatch::Flat => Filter::PointEq(point_id),
            PointMatch::NestedChildren => Filter::point_or_child(point_id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    filters: Vec<Filter>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Readings of `device`, optionally narrowed to one point
    ///
    /// The device's multi flag decides whether children are searched.
    pub fn for_device(device: &Device, point_id: Option<u64>) -> Self {
        let criteria = Self::new().and(Filter::DeviceEq(device.id));
        match point_id {
            Some(point_id) => criteria.and(PointMatch::for_device(device).filter(point_id)),
            None => criteria,
        }
    }

    /// Readings that carry `point_id` on the parent or in a child, any device
    pub fn for_point(point_id: u64) -> Self {
        Self::new().and(Filter::point_or_child(point_id))
    }

    pub fn and(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add the page's origin-time window when it is well formed
    pub fn within(self, page: &PageParams) -> Self {
        match page.time_window() {
            Some((start, end)) => self.and(Filter::OriginTimeBetween(start, end)),
            None => self,
        }
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn matches(&self, value: &PointValue) -> bool {
        self.filters.iter().all(|f| f.matches(value))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use point_model::ChildValue;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_flat_device_matches_own_point_only() {
        let criteria = Criteria::for_device(&Device::new(1, false), Some(7));
        assert_eq!(
            criteria.filters(),
            &[Filter::DeviceEq(1), Filter::PointEq(7)]
        );

        let mut nested = PointValue::multi(1, vec![ChildValue::new(7, "x")], ts(0));
        nested.multi = false;
        assert!(!criteria.matches(&nested));
        assert!(criteria.matches(&PointValue::new(1, 7, "x", ts(0))));
    }

    #[test]
    fn test_multi_device_matches_parent_or_child() {
        let criteria = Criteria::for_device(&Device::new(4, true), Some(7));

        let by_child = PointValue::multi(4, vec![ChildValue::new(7, "1")], ts(0));
        assert!(criteria.matches(&by_child));

        let mut by_parent = PointValue::multi(4, vec![ChildValue::new(8, "1")], ts(0));
        by_parent.point_id = Some(7);
        assert!(criteria.matches(&by_parent));

        let other = PointValue::multi(4, vec![ChildValue::new(8, "1")], ts(0));
        assert!(!criteria.matches(&other));

        let other_device = PointValue::multi(5, vec![ChildValue::new(7, "1")], ts(0));
        assert!(!criteria.matches(&other_device));
    }

    #[test]
    fn test_point_only_criteria_has_no_device_filter() {
        let criteria = Criteria::for_point(3);
        assert!(criteria.matches(&PointValue::new(1, 3, "a", ts(0))));
        assert!(criteria.matches(&PointValue::multi(
            2,
            vec![ChildValue::new(3, "b")],
            ts(0)
        )));
        assert!(!criteria.matches(&PointValue::new(1, 4, "a", ts(0))));
    }

    #[test]
    fn test_window_is_inclusive_and_skipped_when_inverted() {
        let page = PageParams::default().with_window(1_000, 2_000);
        let criteria = Criteria::new().within(&page);
        assert!(criteria.matches(&PointValue::new(1, 1, "", ts(1_000))));
        assert!(criteria.matches(&PointValue::new(1, 1, "", ts(2_000))));
        assert!(!criteria.matches(&PointValue::new(1, 1, "", ts(2_001))));

        let inverted = PageParams::default().with_window(2_000, 1_000);
        assert!(Criteria::new().within(&inverted).is_empty());
    }
}
