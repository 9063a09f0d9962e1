//! Service Bootstrap
//!
//! Connects the configured backends and assembles the shared state.

use std::sync::Arc;
use std::time::Duration;

use errors::{DataError, DataResult};
use point_rtdb::{CacheKeySpace, HotCache, MemoryCache, PointValueCache, RedisCache};
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::config::{CacheBackend, DatasrvConfig, MetadataBackend, StoreBackend};
use crate::dispatcher::Dispatcher;
use crate::metadata::{HttpMetadataClient, MemoryMetadata, MetadataLookup};
use crate::post_handler::{NoopPostHandler, PostHandler};
use crate::query::QueryEngine;
use crate::store::{MemoryStore, PointValueStore, SqliteStore};
use crate::worker_pool::WorkerPool;

/// Connected collaborators of the dispatcher and query engine
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn PointValueStore>,
    pub cache: Arc<dyn HotCache>,
    pub metadata: Arc<dyn MetadataLookup>,
    pub post_handler: Arc<dyn PostHandler>,
}

impl Backends {
    /// Everything in process; metadata starts empty
    pub fn in_memory() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            cache: Arc::new(MemoryCache::new()),
            metadata: Arc::new(MemoryMetadata::new()),
            post_handler: Arc::new(NoopPostHandler),
        }
    }
}

/// Open the backends selected by `config`
///
/// The store must be reachable at startup. Redis is connected lazily so the
/// service can start, and keep persisting, while the cache is down.
/// Memory metadata is rejected here: embedders pass a filled registry to
/// [`assemble`] instead.
pub async fn connect_backends(config: &DatasrvConfig) -> DataResult<Backends> {
    let store: Arc<dyn PointValueStore> = match config.store.backend {
        StoreBackend::Sqlite => Arc::new(
            SqliteStore::connect(&config.store.sqlite_url, config.store.max_connections).await?,
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory store; readings are lost on restart");
            Arc::new(MemoryStore::new())
        },
    };

    let cache: Arc<dyn HotCache> = match config.cache.backend {
        CacheBackend::Redis => {
            let cache = RedisCache::connect_lazy(config.redis.clone()).await?;
            match cache.ping().await {
                Ok(()) => info!("Redis cache ready: {}", cache.client().url()),
                Err(e) => warn!("Redis not reachable yet, cache writes will fail: {}", e),
            }
            Arc::new(cache)
        },
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
    };

    let metadata: Arc<dyn MetadataLookup> = match config.metadata.backend {
        MetadataBackend::Http => {
            let timeout = Duration::from_millis(config.metadata.timeout_ms);
            let client = HttpMetadataClient::new(config.metadata.base_url.clone(), timeout)?;
            info!("Metadata from {}", client.base_url());
            Arc::new(client)
        },
        MetadataBackend::Memory => {
            return Err(DataError::InvalidConfig {
                field: "metadata.backend".to_string(),
                reason: "memory metadata has no source in a standalone service; use http"
                    .to_string(),
            });
        },
    };

    Ok(Backends {
        store,
        cache,
        metadata,
        post_handler: Arc::new(NoopPostHandler),
    })
}

/// Wire dispatcher and query engine over one worker pool
pub fn assemble(config: DatasrvConfig, backends: Backends) -> AppState {
    let pool = WorkerPool::new(config.worker.max_concurrency);
    let cache = PointValueCache::new(
        backends.cache,
        CacheKeySpace::new(config.cache.key_prefix.clone()),
    )
    .with_default_ttl(config.cache.default_ttl());

    let dispatcher = Dispatcher::new(
        pool.clone(),
        Arc::clone(&backends.store),
        cache.clone(),
        backends.post_handler,
    );
    let query = QueryEngine::new(
        pool.clone(),
        Arc::clone(&backends.store),
        cache.clone(),
        backends.metadata,
        &config.query,
    );

    info!(
        "Worker pool: {} concurrent units, cache prefix '{}'",
        pool.max_concurrency(),
        cache.keys().prefix
    );

    AppState::new(
        Arc::new(config),
        dispatcher,
        query,
        pool,
        backends.store,
        cache,
    )
}

/// Connect and assemble in one step
pub async fn build_state(config: DatasrvConfig) -> DataResult<AppState> {
    let backends = connect_backends(&config).await?;
    Ok(assemble(config, backends))
}
