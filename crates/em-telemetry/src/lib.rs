//! Emotion monitor telemetry storage.
//!
//! This crate provides:
//! - Arrow schema definitions for the two event tables
//! - Storage engines: durable Parquet segments and an in-memory store
//! - Typed page-visit and prediction logs over an engine
//! - The startup sequence that ensures both schemas exist

pub mod engine;
pub mod lock;
pub mod predictions;
pub mod record;
pub mod schema;
pub mod store;
pub mod visits;

pub use engine::{MemoryEngine, ParquetEngine, StorageEngine, StoreError};
pub use predictions::PredictionLog;
pub use record::{PageVisitRecord, PredictionRecord, TableRecord};
pub use schema::{emotion_clf_schema, page_visited_schema, SchemaManifest, TableName};
pub use store::TelemetryStore;
pub use visits::{count_by_page, rank, PageCount, PageVisitLog};

/// Schema version written to table manifests.
pub const SCHEMA_VERSION: &str = "1.0.0";
