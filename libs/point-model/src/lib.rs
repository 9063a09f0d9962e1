//! Point Model Library
//!
//! Data types shared by the ingestion and query paths of the data service.
//!
//! # Modules
//!
//! - `point_value`: a single reading (flat point or multi-channel parent)
//! - `metadata`: read-only Device and Point projections
//! - `query`: list criteria, page parameters and the page result
//! - `time_unit`: cache expiry units carried on readings

pub mod metadata;
pub mod point_value;
pub mod query;
pub mod serde_helpers;
pub mod time_unit;

// Re-exports for convenience
pub use metadata::{Device, Point};
pub use point_value::{ChildValue, PointValue};
pub use query::{Page, PageParams, PointValueQuery};
pub use time_unit::TimeUnit;
