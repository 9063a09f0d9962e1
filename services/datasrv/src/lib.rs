//! Datasrv library exports
//!
//! Point value ingestion and query service:
//! - `dispatcher`: fire-and-forget fan-out to hook, store and cache
//! - `query`: realtime (cache), latest and paged history (store)
//! - `store`, `metadata`: backends behind traits
//! - `routes`, `api`: axum HTTP surface

pub mod api;
pub mod app_state;
pub mod bootstrap;
pub mod config;
pub mod criteria;
pub mod dispatcher;
pub mod metadata;
pub mod post_handler;
pub mod query;
pub mod routes;
pub mod store;
pub mod worker_pool;

// Re-export commonly used types
pub use app_state::AppState;
pub use config::DatasrvConfig;
pub use criteria::{Criteria, Filter, PointMatch};
pub use dispatcher::Dispatcher;
pub use metadata::{HttpMetadataClient, MemoryMetadata, MetadataLookup};
pub use post_handler::{NoopPostHandler, PostHandler};
pub use query::QueryEngine;
pub use store::{MemoryStore, PointValueStore, SqliteStore, Window};
pub use worker_pool::WorkerPool;
