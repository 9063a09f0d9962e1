//! Redis implementation of the hot cache

use crate::traits::HotCache;
use async_trait::async_trait;
use bytes::Bytes;
use common::redis::{RedisClient, RedisConfig};
use errors::{DataError, DataResult};
use std::sync::Arc;
use std::time::Duration;

fn redis_error(err: anyhow::Error) -> DataError {
    DataError::unavailable("redis", format!("{:#}", err))
}

/// Redis-backed cache; values are stored as plain strings
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: Arc<RedisClient>,
}

impl RedisCache {
    /// Connect and verify the server answers PING
    pub async fn connect(config: RedisConfig) -> DataResult<Self> {
        let client = RedisClient::with_config(config).await.map_err(redis_error)?;
        Ok(Self::from_client(Arc::new(client)))
    }

    /// Build without touching the network; the first command connects
    pub async fn connect_lazy(config: RedisConfig) -> DataResult<Self> {
        let client = RedisClient::with_config_no_ping(config)
            .await
            .map_err(redis_error)?;
        Ok(Self::from_client(Arc::new(client)))
    }

    /// Create from existing RedisClient
    pub fn from_client(client: Arc<RedisClient>) -> Self {
        Self { client }
    }

    /// Underlying client, for commands outside the cache trait
    pub fn client(&self) -> &Arc<RedisClient> {
        &self.client
    }
}

#[async_trait]
impl HotCache for RedisCache {
    async fn get(&self, key: &str) -> DataResult<Option<Bytes>> {
        let value: Option<Vec<u8>> = self.client.get(key).await.map_err(redis_error)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> DataResult<()> {
        self.client
            .put(key, value.to_vec(), ttl)
            .await
            .map_err(redis_error)
    }

    async fn get_many(&self, keys: &[String]) -> DataResult<Vec<Option<Bytes>>> {
        let values: Vec<Option<Vec<u8>>> = self.client.mget(keys).await.map_err(redis_error)?;
        Ok(values.into_iter().map(|v| v.map(Bytes::from)).collect())
    }

    async fn ping(&self) -> DataResult<()> {
        self.client.ping().await.map_err(redis_error)?;
        Ok(())
    }
}
