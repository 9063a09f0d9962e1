//! Read paths: realtime (cache), latest and paged history (durable store)
//!
//! Missing metadata degrades to an empty result. Store and cache failures
//! propagate. No read ever returns the `time_out`/`time_unit` directives.

use crate::config::QuerySection;
use crate::criteria::Criteria;
use crate::metadata::MetadataLookup;
use crate::store::{PointValueStore, Window};
use crate::worker_pool::WorkerPool;
use errors::{validation_error, DataError, DataResult};
use futures::future::try_join_all;
use point_model::{Device, Page, PointValue, PointValueQuery};
use point_rtdb::PointValueCache;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct QueryEngine {
    pool: WorkerPool,
    store: Arc<dyn PointValueStore>,
    cache: PointValueCache,
    metadata: Arc<dyn MetadataLookup>,
    timeout: Duration,
    reject_inverted_window: bool,
}

fn log_lookup_failure(what: &str, id: u64, err: &DataError) {
    match err {
        DataError::NotFound { .. } => debug!("{} {} not found", what, id),
        other => warn!("{} {} lookup failed: {}", what, id, other),
    }
}

async fn joined<T>(handle: JoinHandle<DataResult<T>>) -> DataResult<T> {
    handle
        .await
        .map_err(|e| DataError::Internal(format!("query task failed: {}", e)))?
}

impl QueryEngine {
    pub fn new(
        pool: WorkerPool,
        store: Arc<dyn PointValueStore>,
        cache: PointValueCache,
        metadata: Arc<dyn MetadataLookup>,
        options: &QuerySection,
    ) -> Self {
        Self {
            pool,
            store,
            cache,
            metadata,
            timeout: options.timeout(),
            reject_inverted_window: options.reject_inverted_window,
        }
    }

    // ========================================================================
    // Realtime (cache)
    // ========================================================================

    /// Latest cached reading of every point of the device
    pub async fn realtime(&self, device_id: u64) -> DataResult<Vec<PointValue>> {
        let points = match self.metadata.get_points_by_device(device_id).await {
            Ok(points) => points,
            Err(e) => {
                log_lookup_failure("points of device", device_id, &e);
                return Ok(Vec::new());
            },
        };

        let mut seen = HashSet::new();
        let point_ids: Vec<u64> = points
            .iter()
            .map(|p| p.id)
            .filter(|id| seen.insert(*id))
            .collect();
        if point_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.cache.read_points(device_id, &point_ids).await
    }

    /// Latest cached reading of one point
    pub async fn realtime_point(&self, device_id: u64, point_id: u64) -> DataResult<Option<PointValue>> {
        self.cache.read(device_id, Some(point_id)).await
    }

    // ========================================================================
    // Latest (durable store)
    // ========================================================================

    async fn device(&self, device_id: u64) -> Option<Device> {
        match self.metadata.get_device(device_id).await {
            Ok(device) => Some(device),
            Err(e) => {
                log_lookup_failure("device", device_id, &e);
                None
            },
        }
    }

    async fn latest_for(&self, device: &Device, point_id: u64) -> DataResult<Option<PointValue>> {
        let criteria = Criteria::for_device(device, Some(point_id));
        Ok(self
            .store
            .find_one(&criteria)
            .await?
            .map(PointValue::strip_transient))
    }

    /// Most recent stored reading of one point
    pub async fn latest_point(&self, device_id: u64, point_id: u64) -> DataResult<Option<PointValue>> {
        match self.device(device_id).await {
            Some(device) => self.latest_for(&device, point_id).await,
            None => Ok(None),
        }
    }

    /// Most recent stored reading of every point of the device, decorated
    /// with the point's `rw`/`type`/`unit`; points without readings are
    /// skipped
    pub async fn latest(&self, device_id: u64) -> DataResult<Vec<PointValue>> {
        let Some(device) = self.device(device_id).await else {
            return Ok(Vec::new());
        };
        let points = match self.metadata.get_points_by_device(device_id).await {
            Ok(points) => points,
            Err(e) => {
                log_lookup_failure("points of device", device_id, &e);
                return Ok(Vec::new());
            },
        };

        let device = &device;
        let lookups = points.iter().map(|point| async move {
            let latest = self.latest_for(device, point.id).await?;
            Ok::<_, DataError>(latest.map(|value| value.decorate(point)))
        });
        let found = try_join_all(lookups).await?;
        Ok(found.into_iter().flatten().collect())
    }

    // ========================================================================
    // Paged history (durable store)
    // ========================================================================

    /// Translate list criteria; `None` means a referenced entity is unknown
    async fn list_criteria(&self, query: &PointValueQuery) -> Option<Criteria> {
        let criteria = match (query.device_id, query.point_id) {
            (Some(device_id), point_id) => {
                let device = self.device(device_id).await?;
                Criteria::for_device(&device, point_id)
            },
            (None, Some(point_id)) => match self.metadata.get_point(point_id).await {
                Ok(_) => Criteria::for_point(point_id),
                Err(e) => {
                    log_lookup_failure("point", point_id, &e);
                    return None;
                },
            },
            (None, None) => Criteria::new(),
        };
        Some(criteria.within(&query.page))
    }

    /// One page of history, newest first
    ///
    /// Count and fetch run concurrently on the worker pool under a single
    /// deadline; if either fails or the deadline passes the query fails.
    pub async fn list(&self, query: &PointValueQuery) -> DataResult<Page<PointValue>> {
        let page = query.page;
        if page.is_inverted() && self.reject_inverted_window {
            return Err(validation_error!(
                "start_time {} is after end_time {}",
                page.start_time,
                page.end_time
            ));
        }

        let Some(criteria) = self.list_criteria(query).await else {
            return Ok(Page::empty(&page));
        };
        let criteria = Arc::new(criteria);

        let count = {
            let store = Arc::clone(&self.store);
            let criteria = Arc::clone(&criteria);
            self.pool
                .spawn(async move { store.count(&criteria).await })?
        };
        let fetch = {
            let store = Arc::clone(&self.store);
            let window = Window::from(&page);
            self.pool
                .spawn(async move { store.find(&criteria, window).await })?
        };
        let aborts = [count.abort_handle(), fetch.abort_handle()];

        let (total, records) =
            match tokio::time::timeout(self.timeout, async { tokio::try_join!(joined(count), joined(fetch)) }).await {
                Ok(result) => result?,
                Err(_) => {
                    aborts.iter().for_each(|h| h.abort());
                    return Err(DataError::Timeout(format!(
                        "paged query exceeded {:?}",
                        self.timeout
                    )));
                },
            };

        let records = records
            .into_iter()
            .map(PointValue::strip_transient)
            .collect();
        Ok(Page::new(&page, total, records))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;
    use crate::metadata::MemoryMetadata;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use point_model::{ChildValue, PageParams, Point};
    use point_rtdb::helpers::create_test_point_cache;

    fn ts(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    fn point(id: u64, device_id: u64, unit: &str) -> Point {
        let mut point = Point::new(id, device_id);
        point.unit = Some(unit.to_string());
        point
    }

    fn metadata() -> Arc<MemoryMetadata> {
        Arc::new(
            MemoryMetadata::new()
                .with_device(Device::new(1, false), [point(10, 1, "V"), point(11, 1, "A")])
                .with_device(Device::new(2, true), [point(20, 2, "kW"), point(21, 2, "kW")]),
        )
    }

    fn engine_with(store: Arc<dyn PointValueStore>, options: QuerySection) -> (QueryEngine, PointValueCache) {
        let (_backend, cache) = create_test_point_cache();
        let engine = QueryEngine::new(WorkerPool::new(8), store, cache.clone(), metadata(), &options);
        (engine, cache)
    }

    fn engine(store: Arc<MemoryStore>) -> (QueryEngine, PointValueCache) {
        engine_with(store, QuerySection::default())
    }

    #[tokio::test]
    async fn test_latest_point_picks_newest_origin_time() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(&[
                PointValue::new(1, 10, "old", ts(1_000)),
                PointValue::new(1, 10, "new", ts(2_000)),
                PointValue::new(1, 11, "other", ts(3_000)),
            ])
            .await
            .unwrap();
        let (engine, _) = engine(store);

        let latest = engine.latest_point(1, 10).await.unwrap().unwrap();
        assert_eq!(latest.value, "new");
        assert!(engine.latest_point(1, 12).await.unwrap().is_none());
        assert!(engine.latest_point(99, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_point_on_multi_device_searches_children() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(&[
                PointValue::multi(2, vec![ChildValue::new(20, "1"), ChildValue::new(21, "2")], ts(1_000)),
                PointValue::multi(2, vec![ChildValue::new(21, "3")], ts(2_000)),
            ])
            .await
            .unwrap();
        let (engine, _) = engine(store);

        let for_20 = engine.latest_point(2, 20).await.unwrap().unwrap();
        assert_eq!(for_20.origin_time, ts(1_000));
        let for_21 = engine.latest_point(2, 21).await.unwrap().unwrap();
        assert_eq!(for_21.origin_time, ts(2_000));
    }

    #[tokio::test]
    async fn test_latest_decorates_and_skips_points_without_readings() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(&[PointValue::new(1, 10, "230", ts(1_000))])
            .await
            .unwrap();
        let (engine, _) = engine(store);

        let latest = engine.latest(1).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].point_id, Some(10));
        assert_eq!(latest[0].unit.as_deref(), Some("V"));

        assert!(engine.latest(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_realtime_reads_cached_points_of_device() {
        let (engine, cache) = engine(Arc::new(MemoryStore::new()));
        cache
            .write(&PointValue::new(1, 10, "1.0", ts(1_000)))
            .await
            .unwrap();

        let values = engine.realtime(1).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].point_id, Some(10));

        assert!(engine.realtime_point(1, 11).await.unwrap().is_none());
        assert!(engine.realtime(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_second_page() {
        let store = Arc::new(MemoryStore::new());
        let values: Vec<PointValue> = (1..=25)
            .map(|i| PointValue::new(1, 10, i.to_string(), ts(i * 1_000)))
            .collect();
        store.insert_many(&values).await.unwrap();
        let (engine, _) = engine(store);

        let query = PointValueQuery::for_device(1).with_page(PageParams::new(2, 10));
        let page = engine.list(&query).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.records.len(), 10);
        // newest first: page 2 holds the 11th..20th newest
        assert_eq!(page.records[0].value, "15");
        assert_eq!(page.records[9].value, "6");
    }

    #[tokio::test]
    async fn test_list_point_only_matches_children_across_devices() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(&[
                PointValue::multi(2, vec![ChildValue::new(20, "1")], ts(1_000)),
                PointValue::new(1, 10, "x", ts(2_000)),
            ])
            .await
            .unwrap();
        let (engine, _) = engine(store);

        let page = engine.list(&PointValueQuery::for_point(20)).await.unwrap();
        assert_eq!(page.total, 1);
        assert!(page.records[0].multi);

        let unknown = engine.list(&PointValueQuery::for_point(77)).await.unwrap();
        assert_eq!(unknown.total, 0);
        assert!(unknown.records.is_empty());
    }

    #[tokio::test]
    async fn test_list_inverted_window() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_many(&[PointValue::new(1, 10, "x", ts(1_500))])
            .await
            .unwrap();
        let query = PointValueQuery::for_device(1)
            .with_page(PageParams::default().with_window(2_000, 1_000));

        let (lenient, _) = engine(store.clone());
        assert_eq!(lenient.list(&query).await.unwrap().total, 1);

        let strict_options = QuerySection {
            reject_inverted_window: true,
            ..Default::default()
        };
        let (strict, _) = engine_with(store, strict_options);
        let err = strict.list(&query).await.unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    struct SlowStore;

    #[async_trait]
    impl PointValueStore for SlowStore {
        async fn insert_many(&self, _values: &[PointValue]) -> DataResult<()> {
            Ok(())
        }

        async fn find(&self, _criteria: &Criteria, _window: Window) -> DataResult<Vec<PointValue>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn count(&self, _criteria: &Criteria) -> DataResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_times_out_as_a_whole() {
        let options = QuerySection {
            timeout_ms: 100,
            ..Default::default()
        };
        let (engine, _) = engine_with(Arc::new(SlowStore), options);

        let err = engine.list(&PointValueQuery::default()).await.unwrap_err();
        assert_eq!(err.error_code(), "TIMEOUT");
    }
}
