//! In-memory engine.
//!
//! Tables are vectors of batches behind one mutex, so each insert is atomic
//! and scans see batches in insertion order. Nothing survives the process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use arrow::array::RecordBatch;

use super::{check_batch_schema, StorageEngine, StoreError};
use crate::schema::TableName;

/// Process-local engine. Batches live as long as the engine.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    tables: Mutex<HashMap<TableName, Vec<RecordBatch>>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, HashMap<TableName, Vec<RecordBatch>>> {
        // A panic while holding the lock cannot leave a half-pushed batch.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageEngine for MemoryEngine {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn ensure_schema(&self, table: TableName) -> Result<(), StoreError> {
        self.tables().entry(table).or_default();
        Ok(())
    }

    fn insert(&self, table: TableName, batch: &RecordBatch) -> Result<(), StoreError> {
        check_batch_schema(table, batch)?;
        let mut tables = self.tables();
        let rows = tables
            .get_mut(&table)
            .ok_or(StoreError::SchemaMissing(table))?;
        rows.push(batch.clone());
        tracing::debug!(table = %table, rows = batch.num_rows(), "memory insert");
        Ok(())
    }

    fn scan_all(&self, table: TableName) -> Result<Vec<RecordBatch>, StoreError> {
        self.tables()
            .get(&table)
            .cloned()
            .ok_or(StoreError::SchemaMissing(table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{PageVisitRecord, TableRecord};
    use em_common::IstTimestamp;

    fn visit_batch(page: &str) -> RecordBatch {
        PageVisitRecord::new(page, IstTimestamp::now())
            .to_batch()
            .unwrap()
    }

    #[test]
    fn test_insert_requires_schema() {
        let engine = MemoryEngine::new();
        let err = engine
            .insert(TableName::PageVisited, &visit_batch("Home"))
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaMissing(TableName::PageVisited)));
        assert!(engine.scan_all(TableName::PageVisited).is_err());
    }

    #[test]
    fn test_ensure_schema_twice_keeps_rows() {
        let engine = MemoryEngine::new();
        engine.ensure_schema(TableName::PageVisited).unwrap();
        engine
            .insert(TableName::PageVisited, &visit_batch("Home"))
            .unwrap();
        engine.ensure_schema(TableName::PageVisited).unwrap();
        assert_eq!(engine.row_count(TableName::PageVisited).unwrap(), 1);
    }

    #[test]
    fn test_empty_table_scans_empty() {
        let engine = MemoryEngine::new();
        engine.ensure_schema(TableName::EmotionClf).unwrap();
        assert!(engine.scan_all(TableName::EmotionClf).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_batch_for_other_table() {
        let engine = MemoryEngine::new();
        engine.ensure_schema(TableName::EmotionClf).unwrap();
        let err = engine
            .insert(TableName::EmotionClf, &visit_batch("Home"))
            .unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { .. }));
    }
}
