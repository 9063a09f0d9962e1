//! Pooled Redis access
//!
//! A bb8 pool of multiplexed connections plus the handful of string
//! commands the point value cache issues: GET, SET with optional PX expiry,
//! MGET and PING.

use anyhow::{Context, Result};
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::{AsyncCommands, FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Pool settings; durations are whole seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
    /// Idle connections kept warm; `None` opens connections on demand only
    pub min_idle: Option<u32>,
    /// How long a checkout may wait for a connection
    pub connection_timeout: u64,
    pub max_lifetime: Option<u64>,
    pub idle_timeout: Option<u64>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            max_connections: 32,
            min_idle: Some(2),
            connection_timeout: 5,
            max_lifetime: Some(3_600),
            idle_timeout: Some(600),
        }
    }
}

impl RedisConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    fn secs(value: Option<u64>) -> Option<Duration> {
        value.map(Duration::from_secs)
    }
}

type Connection<'a> = PooledConnection<'a, RedisConnectionManager>;

/// Largest `PX` the server accepts once the current time is added to it
const MAX_PX_MILLIS: u128 = (i64::MAX / 2) as u128;

#[derive(Clone)]
pub struct RedisClient {
    pool: Arc<Pool<RedisConnectionManager>>,
    url: String,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("RedisClient")
            .field("url", &self.url)
            .field("connections", &state.connections)
            .field("idle", &state.idle_connections)
            .finish()
    }
}

impl RedisClient {
    /// Connect with default pool settings and verify with PING
    pub async fn new(url: &str) -> Result<Self> {
        Self::with_config(RedisConfig::from_url(url)).await
    }

    /// Build the pool and verify the server answers PING
    pub async fn with_config(config: RedisConfig) -> Result<Self> {
        let client = Self::with_config_no_ping(config).await?;
        client
            .ping()
            .await
            .with_context(|| format!("Redis at {} did not answer PING", client.url))?;
        Ok(client)
    }

    /// Build the pool without touching the network
    ///
    /// Succeeds while the server is down; the first command reports it.
    pub async fn with_config_no_ping(config: RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .with_context(|| format!("Invalid Redis URL: {}", config.url))?;

        let pool = Pool::builder()
            .max_size(config.max_connections.max(1))
            .min_idle(config.min_idle)
            .connection_timeout(Duration::from_secs(config.connection_timeout))
            .max_lifetime(RedisConfig::secs(config.max_lifetime))
            .idle_timeout(RedisConfig::secs(config.idle_timeout))
            .build_unchecked(manager);

        Ok(Self {
            pool: Arc::new(pool),
            url: config.url,
        })
    }

    /// Unverified client from a bare URL
    pub async fn new_unchecked(url: &str) -> Result<Self> {
        Self::with_config_no_ping(RedisConfig::from_url(url)).await
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn conn(&self) -> Result<Connection<'_>> {
        self.pool
            .get()
            .await
            .with_context(|| format!("No Redis connection available ({})", self.url))
    }

    pub async fn get<T: FromRedisValue>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn().await?;
        conn.get(key)
            .await
            .with_context(|| format!("GET {}", key))
    }

    /// SET, with `PX` when `ttl` is given
    ///
    /// Sub-millisecond expiries are rounded up since the server rejects `PX 0`.
    /// Expiries beyond what the server can represent are written without one.
    pub async fn put<T>(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>
    where
        T: ToRedisArgs + Send + Sync,
    {
        let mut conn = self.conn().await?;
        match ttl.map(|ttl| ttl.as_millis()) {
            Some(millis) if millis <= MAX_PX_MILLIS => {
                let millis = millis.max(1) as u64;
                conn.pset_ex(key, value, millis)
                    .await
                    .with_context(|| format!("SET {} PX {}", key, millis))
            },
            _ => conn
                .set(key, value)
                .await
                .with_context(|| format!("SET {}", key)),
        }
    }

    /// MGET; one slot per key, in request order
    pub async fn mget<T: FromRedisValue>(&self, keys: &[String]) -> Result<Vec<Option<T>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn().await?;
        redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut *conn)
            .await
            .with_context(|| format!("MGET ({} keys)", keys.len()))
    }

    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.conn().await?;
        redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .context("PING")
    }
}
