//! SQLite-backed store
//!
//! Multi-channel children are kept as a JSON array column and searched with
//! `json_each`. Timestamps are stored as epoch milliseconds.

use super::{persisted_form, PointValueStore, Window};
use crate::criteria::{Criteria, Filter};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use errors::{DataError, DataResult};
use point_model::{ChildValue, PointValue};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    QueryBuilder, Sqlite, SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS point_values (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        device_id INTEGER NOT NULL,
        point_id INTEGER,
        value TEXT NOT NULL DEFAULT '',
        raw_value TEXT NOT NULL DEFAULT '',
        multi INTEGER NOT NULL DEFAULT 0,
        children TEXT,
        origin_time INTEGER NOT NULL,
        create_time INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_point_values_device_time
        ON point_values (device_id, origin_time DESC)",
    "CREATE INDEX IF NOT EXISTS idx_point_values_point_time
        ON point_values (point_id, origin_time DESC)",
];

const SELECT_COLUMNS: &str = "SELECT device_id, point_id, value, raw_value, multi, children, \
     origin_time, create_time FROM point_values";

#[derive(Debug, sqlx::FromRow)]
struct PointValueRow {
    device_id: i64,
    point_id: Option<i64>,
    value: String,
    raw_value: String,
    multi: bool,
    children: Option<String>,
    origin_time: i64,
    create_time: Option<i64>,
}

fn from_millis(ms: i64) -> DataResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| DataError::Serialization(format!("timestamp out of range: {}", ms)))
}

impl TryFrom<PointValueRow> for PointValue {
    type Error = DataError;

    fn try_from(row: PointValueRow) -> DataResult<Self> {
        let children: Vec<ChildValue> = match row.children.as_deref() {
            Some(json) if !json.is_empty() => serde_json::from_str(json)?,
            _ => Vec::new(),
        };
        Ok(PointValue {
            device_id: row.device_id as u64,
            point_id: row.point_id.map(|id| id as u64),
            value: row.value,
            raw_value: row.raw_value,
            multi: row.multi,
            children,
            origin_time: from_millis(row.origin_time)?,
            create_time: row.create_time.map(from_millis).transpose()?,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and apply the schema
    ///
    /// In-memory URLs get a single pinned connection so every query sees
    /// the same database.
    pub async fn connect(url: &str, max_connections: u32) -> DataResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DataError::unavailable(
                            "sqlite",
                            format!("cannot create {}: {}", parent.display(), e),
                        )
                    })?;
                }
            }
        }

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!("SQLite point value store ready: {}", url);
        Ok(store)
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the table and indexes when absent
    pub async fn migrate(&self) -> DataResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

/// Append `WHERE ...` for the criteria (nothing when empty)
fn push_where(builder: &mut QueryBuilder<'_, Sqlite>, criteria: &Criteria) {
    for (i, filter) in criteria.filters().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_filter(builder, filter);
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    match filter {
        Filter::DeviceEq(id) => {
            builder.push("device_id = ").push_bind(*id as i64);
        },
        Filter::PointEq(id) => {
            builder.push("point_id = ").push_bind(*id as i64);
        },
        Filter::ChildPointEq(id) => {
            builder
                .push(
                    "EXISTS (SELECT 1 FROM json_each(point_values.children) \
                     WHERE json_extract(json_each.value, '$.point_id') = ",
                )
                .push_bind(*id as i64)
                .push(")");
        },
        Filter::AnyOf(filters) if filters.is_empty() => {
            builder.push("0");
        },
        Filter::AnyOf(filters) => {
            builder.push("(");
            for (i, inner) in filters.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                push_filter(builder, inner);
            }
            builder.push(")");
        },
        Filter::OriginTimeBetween(start, end) => {
            builder
                .push("origin_time BETWEEN ")
                .push_bind(start.timestamp_millis())
                .push(" AND ")
                .push_bind(end.timestamp_millis());
        },
    }
}

#[async_trait]
impl PointValueStore for SqliteStore {
    async fn insert_many(&self, values: &[PointValue]) -> DataResult<()> {
        if values.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for value in values.iter().map(persisted_form) {
            let children = if value.children.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&value.children)?)
            };
            sqlx::query(
                "INSERT INTO point_values \
                 (device_id, point_id, value, raw_value, multi, children, origin_time, create_time) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(value.device_id as i64)
            .bind(value.point_id.map(|id| id as i64))
            .bind(&value.value)
            .bind(&value.raw_value)
            .bind(value.multi)
            .bind(children)
            .bind(value.origin_time.timestamp_millis())
            .bind(value.create_time.map(|t| t.timestamp_millis()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Inserted {} point values", values.len());
        Ok(())
    }

    async fn find(&self, criteria: &Criteria, window: Window) -> DataResult<Vec<PointValue>> {
        let mut builder = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        push_where(&mut builder, criteria);
        builder
            .push(" ORDER BY origin_time DESC, id DESC LIMIT ")
            .push_bind(window.limit.min(i64::MAX as u64) as i64)
            .push(" OFFSET ")
            .push_bind(window.skip.min(i64::MAX as u64) as i64);

        let rows: Vec<PointValueRow> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(PointValue::try_from).collect()
    }

    async fn count(&self, criteria: &Criteria) -> DataResult<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM point_values");
        push_where(&mut builder, criteria);

        let (count,): (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn ping(&self) -> DataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
