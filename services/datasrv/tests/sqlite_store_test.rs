//! SQLite store against in-memory and on-disk databases

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

mod common;

use common::ts;
use datasrv::{Criteria, Filter, PointValueStore, SqliteStore, Window};
use point_model::{ChildValue, Device, PageParams, PointValue, TimeUnit};

async fn memory_store() -> SqliteStore {
    SqliteStore::connect("sqlite::memory:", 1).await.unwrap()
}

#[tokio::test]
async fn test_newest_first_with_insertion_tiebreak() {
    let store = memory_store().await;
    store
        .insert_many(&[
            PointValue::new(1, 10, "a", ts(1_000)),
            PointValue::new(1, 10, "b", ts(3_000)),
            PointValue::new(1, 10, "c", ts(3_000)),
            PointValue::new(1, 10, "d", ts(2_000)),
        ])
        .await
        .unwrap();

    let all = store
        .find(&Criteria::new(), Window { skip: 0, limit: 10 })
        .await
        .unwrap();
    let order: Vec<&str> = all.iter().map(|v| v.value.as_str()).collect();
    assert_eq!(order, ["c", "b", "d", "a"]);
}

#[tokio::test]
async fn test_paging_and_count() {
    let store = memory_store().await;
    let values: Vec<PointValue> = (1..=25)
        .map(|i| PointValue::new(1, 10, i.to_string(), ts(i * 1_000)))
        .collect();
    store.insert_many(&values).await.unwrap();

    let criteria = Criteria::for_device(&Device::new(1, false), Some(10));
    assert_eq!(store.count(&criteria).await.unwrap(), 25);

    let page = PageParams::new(2, 10);
    let records = store.find(&criteria, Window::from(&page)).await.unwrap();
    assert_eq!(records.len(), 10);
    assert_eq!(records[0].value, "15");
    assert_eq!(records[9].value, "6");

    let last = store
        .find(&criteria, Window::from(&PageParams::new(3, 10)))
        .await
        .unwrap();
    assert_eq!(last.len(), 5);
}

#[tokio::test]
async fn test_window_is_inclusive() {
    let store = memory_store().await;
    store
        .insert_many(&[
            PointValue::new(1, 10, "before", ts(999)),
            PointValue::new(1, 10, "start", ts(1_000)),
            PointValue::new(1, 10, "end", ts(2_000)),
            PointValue::new(1, 10, "after", ts(2_001)),
        ])
        .await
        .unwrap();

    let criteria = Criteria::new().within(&PageParams::default().with_window(1_000, 2_000));
    assert_eq!(store.count(&criteria).await.unwrap(), 2);
}

#[tokio::test]
async fn test_multi_device_matches_parent_or_child_point() {
    let store = memory_store().await;
    let mut tagged_parent = PointValue::multi(2, vec![ChildValue::new(21, "0")], ts(3_000));
    tagged_parent.point_id = Some(20);
    store
        .insert_many(&[
            PointValue::multi(2, vec![ChildValue::new(20, "1")], ts(1_000)),
            PointValue::multi(2, vec![ChildValue::new(21, "1")], ts(2_000)),
            tagged_parent,
            PointValue::multi(3, vec![ChildValue::new(20, "1")], ts(4_000)),
        ])
        .await
        .unwrap();

    let criteria = Criteria::for_device(&Device::new(2, true), Some(20));
    assert_eq!(store.count(&criteria).await.unwrap(), 2);
    let newest = store.find_one(&criteria).await.unwrap().unwrap();
    assert_eq!(newest.origin_time, ts(3_000));

    // point-only criteria span devices
    assert_eq!(store.count(&Criteria::for_point(20)).await.unwrap(), 3);
}

#[tokio::test]
async fn test_transient_fields_are_not_persisted() {
    let store = memory_store().await;
    let mut value = PointValue::new(1, 10, "x", ts(1_000)).with_ttl(1, TimeUnit::Hours);
    value.unit = Some("V".into());
    value.create_time = Some(ts(1_500));
    store.insert_many(&[value]).await.unwrap();

    let stored = store.find_one(&Criteria::new()).await.unwrap().unwrap();
    assert!(stored.time_out.is_none());
    assert!(stored.time_unit.is_none());
    assert!(stored.unit.is_none());
    assert_eq!(stored.create_time, Some(ts(1_500)));
}

#[tokio::test]
async fn test_empty_any_of_matches_nothing() {
    let store = memory_store().await;
    store
        .insert_many(&[PointValue::new(1, 10, "x", ts(1_000))])
        .await
        .unwrap();

    let criteria = Criteria::new().and(Filter::AnyOf(Vec::new()));
    assert_eq!(store.count(&criteria).await.unwrap(), 0);
}

#[tokio::test]
async fn test_file_database_survives_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("nested/point_values.db").display());

    {
        let store = SqliteStore::connect(&url, 2).await.unwrap();
        store
            .insert_many(&[PointValue::new(1, 10, "kept", ts(1_000))])
            .await
            .unwrap();
        store.pool().close().await;
    }

    let reopened = SqliteStore::connect(&url, 2).await.unwrap();
    let value = reopened.find_one(&Criteria::new()).await.unwrap().unwrap();
    assert_eq!(value.value, "kept");
    reopened.ping().await.unwrap();
}
