//! HTTP handlers, grouped by concern

pub mod admin_handlers;
pub mod health_handlers;
pub mod ingest_handlers;
pub mod query_handlers;
