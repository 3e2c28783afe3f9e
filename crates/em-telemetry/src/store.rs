//! Startup sequence: one engine, both schemas, both logs.

use std::sync::Arc;

use em_common::{StoreBackend, StoreSettings};

use crate::engine::{MemoryEngine, ParquetEngine, StorageEngine, StoreError};
use crate::predictions::PredictionLog;
use crate::schema::TableName;
use crate::visits::PageVisitLog;

/// The telemetry store after a successful startup.
///
/// Holding a `TelemetryStore` means both tables exist; the engine lives as
/// long as any clone of the store or its logs.
#[derive(Clone)]
pub struct TelemetryStore {
    engine: Arc<dyn StorageEngine>,
    visits: PageVisitLog,
    predictions: PredictionLog,
}

impl TelemetryStore {
    /// Ensure both schemas on `engine` and build the logs over it.
    pub fn open(engine: Arc<dyn StorageEngine>) -> Result<Self, StoreError> {
        for table in TableName::ALL {
            engine.ensure_schema(table).inspect_err(|err| {
                tracing::error!(
                    table = %table,
                    engine = engine.name(),
                    error = %err,
                    "schema setup failed"
                );
            })?;
        }
        tracing::debug!(engine = engine.name(), "telemetry store ready");

        Ok(TelemetryStore {
            visits: PageVisitLog::new(engine.clone()),
            predictions: PredictionLog::new(engine.clone()),
            engine,
        })
    }

    /// Build the engine named by `settings` and open it.
    pub fn from_settings(settings: &StoreSettings) -> Result<Self, StoreError> {
        let engine: Arc<dyn StorageEngine> = match settings.backend {
            StoreBackend::Parquet => Arc::new(ParquetEngine::new(&settings.data_dir)),
            StoreBackend::Memory => Arc::new(MemoryEngine::new()),
        };
        Self::open(engine)
    }

    /// Fresh in-memory store.
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::open(Arc::new(MemoryEngine::new()))
    }

    pub fn visits(&self) -> &PageVisitLog {
        &self.visits
    }

    pub fn predictions(&self) -> &PredictionLog {
        &self.predictions
    }

    pub fn engine(&self) -> &Arc<dyn StorageEngine> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use em_common::IstTimestamp;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_open_twice_on_same_directory() {
        let dir = tempdir().unwrap();
        let settings = StoreSettings {
            backend: StoreBackend::Parquet,
            data_dir: dir.path().to_path_buf(),
        };

        let first = TelemetryStore::from_settings(&settings).unwrap();
        first
            .visits()
            .record_visit("Home", IstTimestamp::now())
            .unwrap();

        let second = TelemetryStore::from_settings(&settings).unwrap();
        assert_eq!(second.visits().all_visits().unwrap().len(), 1);
        assert!(second.predictions().all_predictions().unwrap().is_empty());
    }

    #[test]
    fn test_memory_backend_ignores_data_dir() {
        let settings = StoreSettings {
            backend: StoreBackend::Memory,
            data_dir: PathBuf::from("/nonexistent/never/created"),
        };
        let store = TelemetryStore::from_settings(&settings).unwrap();
        assert_eq!(store.engine().name(), "memory");
        assert!(!settings.data_dir.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_unwritable_directory_fails_schema_setup() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o500)).unwrap();

        // Root ignores permission bits.
        if std::fs::write(locked.join("probe"), b"x").is_ok() {
            return;
        }

        let err = TelemetryStore::open(Arc::new(ParquetEngine::new(&locked)))
            .err()
            .unwrap();
        assert!(matches!(err, StoreError::SchemaInitialization { .. }));
    }
}
