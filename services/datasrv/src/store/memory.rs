//! In-memory store evaluating criteria with [`Criteria::matches`]

use super::{persisted_form, PointValueStore, Window};
use crate::criteria::Criteria;
use async_trait::async_trait;
use errors::DataResult;
use parking_lot::RwLock;
use point_model::PointValue;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<PointValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// All records in insertion order
    pub fn snapshot(&self) -> Vec<PointValue> {
        self.records.read().clone()
    }

    fn sorted_matches(&self, criteria: &Criteria) -> Vec<PointValue> {
        let records = self.records.read();
        let mut matches: Vec<(usize, &PointValue)> = records
            .iter()
            .enumerate()
            .filter(|(_, v)| criteria.matches(v))
            .collect();
        matches.sort_by(|(ia, a), (ib, b)| {
            b.origin_time.cmp(&a.origin_time).then(ib.cmp(ia))
        });
        matches.into_iter().map(|(_, v)| v.clone()).collect()
    }
}

#[async_trait]
impl PointValueStore for MemoryStore {
    async fn insert_many(&self, values: &[PointValue]) -> DataResult<()> {
        let mut records = self.records.write();
        records.extend(values.iter().map(persisted_form));
        Ok(())
    }

    async fn find(&self, criteria: &Criteria, window: Window) -> DataResult<Vec<PointValue>> {
        Ok(self
            .sorted_matches(criteria)
            .into_iter()
            .skip(window.skip as usize)
            .take(window.limit as usize)
            .collect())
    }

    async fn count(&self, criteria: &Criteria) -> DataResult<u64> {
        let records = self.records.read();
        Ok(records.iter().filter(|v| criteria.matches(v)).count() as u64)
    }
}
