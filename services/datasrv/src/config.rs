//! Service configuration
//!
//! Layering: built-in defaults, then the YAML file, then `DATASRV_*`
//! environment variables (`__` separates nested keys, e.g.
//! `DATASRV_STORE__SQLITE_URL`).

use common::redis::RedisConfig;
use common::LoggingConfig;
use errors::{config_error, DataError, DataResult};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/datasrv.yaml";
pub const ENV_PREFIX: &str = "DATASRV_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: "datasrv".to_string(),
            host: "0.0.0.0".to_string(),
            port: 6004,
        }
    }
}

impl ServiceSection {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub backend: CacheBackend,
    pub key_prefix: String,
    /// Expiry for readings that carry none; unset stores without expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl_secs: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            key_prefix: "point_value:".to_string(),
            default_ttl_secs: None,
        }
    }
}

impl CacheSection {
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub sqlite_url: String,
    pub max_connections: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            sqlite_url: "sqlite://data/point_values.db".to_string(),
            max_connections: 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    Http,
    /// In-process registry filled by an embedding application; the
    /// standalone service refuses it since nothing could populate it
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataSection {
    pub backend: MetadataBackend,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for MetadataSection {
    fn default() -> Self {
        Self {
            backend: MetadataBackend::Http,
            base_url: "http://127.0.0.1:6002/api/v1/manager".to_string(),
            timeout_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// Upper bound on concurrently running fan-out and query units
    pub max_concurrency: usize,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            max_concurrency: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySection {
    /// Shared deadline of the count/fetch pair of a paged query
    pub timeout_ms: u64,
    /// Reject `start_time > end_time` instead of ignoring the window
    pub reject_inverted_window: bool,
}

impl Default for QuerySection {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            reject_inverted_window: false,
        }
    }
}

impl QuerySection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasrvConfig {
    pub service: ServiceSection,
    pub redis: RedisConfig,
    pub cache: CacheSection,
    pub store: StoreSection,
    pub metadata: MetadataSection,
    pub worker: WorkerSection,
    pub query: QuerySection,
    pub logging: LoggingConfig,
}

impl DatasrvConfig {
    /// Load from the default path (missing file is fine) plus environment
    pub fn load() -> DataResult<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from an explicit YAML file plus environment
    pub fn load_from(path: &Path) -> DataResult<Self> {
        let config: Self = Self::figment(path)
            .extract()
            .map_err(|e| config_error!("Failed to load configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> DataResult<()> {
        fn invalid(field: &str, reason: &str) -> DataError {
            DataError::InvalidConfig {
                field: field.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.service.name.trim().is_empty() {
            return Err(invalid("service.name", "must not be empty"));
        }
        if self.service.port == 0 {
            return Err(invalid("service.port", "must not be zero"));
        }
        if self.cache.backend == CacheBackend::Redis && self.redis.url.trim().is_empty() {
            return Err(invalid("redis.url", "must not be empty"));
        }
        if self.store.backend == StoreBackend::Sqlite {
            if self.store.sqlite_url.trim().is_empty() {
                return Err(invalid("store.sqlite_url", "must not be empty"));
            }
            if self.store.max_connections == 0 {
                return Err(invalid("store.max_connections", "must be at least 1"));
            }
        }
        if self.metadata.backend == MetadataBackend::Http {
            if self.metadata.base_url.trim().is_empty() {
                return Err(invalid("metadata.base_url", "must not be empty"));
            }
            if self.metadata.timeout_ms == 0 {
                return Err(invalid("metadata.timeout_ms", "must not be zero"));
            }
        }
        if self.worker.max_concurrency == 0 {
            return Err(invalid("worker.max_concurrency", "must be at least 1"));
        }
        if self.query.timeout_ms == 0 {
            return Err(invalid("query.timeout_ms", "must not be zero"));
        }
        Ok(())
    }

    /// Fully in-process configuration (memory cache, store and metadata)
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.cache.backend = CacheBackend::Memory;
        config.store.backend = StoreBackend::Memory;
        config.metadata.backend = MetadataBackend::Memory;
        config
    }
}
