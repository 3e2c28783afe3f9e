//! Storage engines for the telemetry tables.
//!
//! An engine owns the storage medium and knows nothing about the record
//! types beyond the table schemas: records arrive and leave as Arrow
//! [`RecordBatch`]es. Two implementations exist:
//! - [`ParquetEngine`]: durable, one Parquet segment per insert, safe for
//!   concurrent writers across threads and processes
//! - [`MemoryEngine`]: process-local, for tests and throwaway sessions

mod memory;
mod segments;

pub use self::memory::MemoryEngine;
pub use self::segments::ParquetEngine;

use std::path::PathBuf;

use arrow::array::RecordBatch;
use thiserror::Error;

use crate::schema::TableName;

/// Errors from storage engine operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage unavailable for {table}: {source}")]
    Unavailable {
        table: TableName,
        #[source]
        source: std::io::Error,
    },

    #[error("schema initialization failed for {table}: {reason}")]
    SchemaInitialization { table: TableName, reason: String },

    #[error("table {0} has not been initialized")]
    SchemaMissing(TableName),

    #[error("record batch does not match schema of {table}: {reason}")]
    SchemaMismatch { table: TableName, reason: String },

    #[error("corrupt record in {table}: {reason}")]
    CorruptRecord { table: TableName, reason: String },

    #[error("corrupt segment {path} in {table}: {source}")]
    CorruptSegment {
        table: TableName,
        path: PathBuf,
        #[source]
        source: ::parquet::errors::ParquetError,
    },

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl From<StoreError> for em_common::Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SchemaInitialization { table, reason } => {
                em_common::Error::SchemaInitialization {
                    table: table.to_string(),
                    reason,
                }
            }
            StoreError::SchemaMismatch { table, reason } => em_common::Error::SchemaMismatch {
                table: table.to_string(),
                reason,
            },
            StoreError::CorruptRecord { table, reason } => em_common::Error::CorruptRecord {
                table: table.to_string(),
                reason,
            },
            StoreError::CorruptSegment {
                table,
                path,
                source,
            } => em_common::Error::CorruptRecord {
                table: table.to_string(),
                reason: format!("{}: {}", path.display(), source),
            },
            other @ (StoreError::Unavailable { .. }
            | StoreError::SchemaMissing(_)
            | StoreError::Parquet(_)
            | StoreError::Arrow(_)) => em_common::Error::StorageUnavailable(other.to_string()),
        }
    }
}

/// Append-only storage for the two telemetry tables.
///
/// Implementations are shared behind an `Arc` and called through `&self`;
/// each `insert` is atomic as a whole, and `scan_all` returns batches in
/// insertion order.
pub trait StorageEngine: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Create the backing storage for `table` if absent. Idempotent.
    fn ensure_schema(&self, table: TableName) -> Result<(), StoreError>;

    /// Append every row of `batch` to `table`.
    fn insert(&self, table: TableName, batch: &RecordBatch) -> Result<(), StoreError>;

    /// Every batch ever inserted into `table`, oldest first.
    fn scan_all(&self, table: TableName) -> Result<Vec<RecordBatch>, StoreError>;

    /// Total rows stored in `table`.
    fn row_count(&self, table: TableName) -> Result<usize, StoreError> {
        Ok(self
            .scan_all(table)?
            .iter()
            .map(RecordBatch::num_rows)
            .sum())
    }
}

/// Reject a batch whose columns differ from the table schema.
pub(crate) fn check_batch_schema(table: TableName, batch: &RecordBatch) -> Result<(), StoreError> {
    let expected = table.schema();
    let actual = batch.schema();
    if expected.fields().len() != actual.fields().len() {
        return Err(StoreError::SchemaMismatch {
            table,
            reason: format!(
                "expected {} columns, got {}",
                expected.fields().len(),
                actual.fields().len()
            ),
        });
    }
    for (want, got) in expected.fields().iter().zip(actual.fields().iter()) {
        if want.name() != got.name() || want.data_type() != got.data_type() {
            return Err(StoreError::SchemaMismatch {
                table,
                reason: format!(
                    "expected column {}: {}, got {}: {}",
                    want.name(),
                    want.data_type(),
                    got.name(),
                    got.data_type()
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_check_batch_schema_rejects_wrong_columns() {
        let schema = Arc::new(Schema::new(vec![Field::new("page", DataType::Utf8, false)]));
        let column: ArrayRef = Arc::new(StringArray::from(vec!["Home"]));
        let batch = RecordBatch::try_new(schema, vec![column]).unwrap();
        let err = check_batch_schema(TableName::PageVisited, &batch).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_store_error_maps_to_taxonomy() {
        let err: em_common::Error = StoreError::SchemaMissing(TableName::EmotionClf).into();
        assert!(matches!(err, em_common::Error::StorageUnavailable(_)));

        let err: em_common::Error = StoreError::SchemaInitialization {
            table: TableName::PageVisited,
            reason: "conflict".into(),
        }
        .into();
        assert_eq!(err.code(), 61);

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: em_common::Error = StoreError::Unavailable {
            table: TableName::PageVisited,
            source: io,
        }
        .into();
        assert!(err.to_string().contains("page_visited_table"));
    }
}
