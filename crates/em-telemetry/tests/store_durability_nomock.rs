//! No-mock telemetry store tests against real Parquet segments.
//!
//! Validates:
//! - Visits and predictions survive reopening the store
//! - Scans return records in insertion order
//! - Timestamps keep their IST offset and probabilities stay bit-exact
//! - Concurrent writers never lose a record
//! - Segments on disk carry the documented column layout

use std::collections::HashSet;
use std::fs;
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use arrow::datatypes::{DataType, TimeUnit};
use chrono::{TimeZone, Utc};
use em_common::{IstTimestamp, IST};
use em_telemetry::lock::{TableLock, DEFAULT_LOCK_TIMEOUT};
use em_telemetry::{ParquetEngine, PredictionRecord, StorageEngine, TableName, TelemetryStore};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use proptest::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn open_store(dir: &TempDir) -> TelemetryStore {
    TelemetryStore::open(Arc::new(ParquetEngine::new(dir.path()))).expect("open store")
}

fn ts(hour: u32, minute: u32) -> IstTimestamp {
    IstTimestamp::from(Utc.with_ymd_and_hms(2026, 1, 15, hour, minute, 0).unwrap())
}

// ============================================================================
// Page visits
// ============================================================================

#[test]
fn test_record_visit_adds_exactly_one_matching_row() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let before = store.visits().all_visits().unwrap().len();

    let at = ts(9, 15);
    store.visits().record_visit("Monitor", at).unwrap();

    let after = store.visits().all_visits().unwrap();
    assert_eq!(after.len(), before + 1);
    let matching: Vec<_> = after
        .iter()
        .filter(|v| v.page_name == "Monitor" && v.visit_time == at)
        .collect();
    assert_eq!(matching.len(), 1);
}

#[test]
fn test_visit_counts_scenario() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.visits().record_visit("Home", ts(1, 0)).unwrap();
    store.visits().record_visit("Monitor", ts(2, 0)).unwrap();
    store.visits().record_visit("Home", ts(3, 0)).unwrap();

    let counts = store.visits().visit_counts_by_page().unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts.get("Home"), Some(&2));
    assert_eq!(counts.get("Monitor"), Some(&1));
}

#[test]
fn test_visits_survive_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        store.visits().record_visit("Home", ts(8, 0)).unwrap();
        store.visits().record_visit("About", ts(8, 5)).unwrap();
    }

    let reopened = open_store(&dir);
    let visits = reopened.visits().all_visits().unwrap();
    let pages: Vec<_> = visits.iter().map(|v| v.page_name.as_str()).collect();
    assert_eq!(pages, ["Home", "About"]);
    assert!(visits.iter().all(|v| v.visit_time.offset() == IST));
}

// ============================================================================
// Predictions
// ============================================================================

#[test]
fn test_prediction_roundtrip_across_reopen() {
    let dir = TempDir::new().unwrap();
    let at = IstTimestamp::now();
    let confidence = 0.734_291_003_118_2_f64;
    {
        let store = open_store(&dir);
        store
            .predictions()
            .record_prediction("I am so happy today", "happy", confidence, at)
            .unwrap();
    }

    let reopened = open_store(&dir);
    let predictions = reopened.predictions().all_predictions().unwrap();
    assert_eq!(predictions.len(), 1);
    let record = &predictions[0];
    assert_eq!(record.text, "I am so happy today");
    assert_eq!(record.prediction, "happy");
    assert_eq!(record.probability.to_bits(), confidence.to_bits());
    assert_eq!(record.time, at);
    assert_eq!(record.time.offset(), at.offset());
    assert_eq!(record.time.to_rfc3339(), at.to_rfc3339());
}

#[test]
fn test_empty_store_scans_empty() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert!(store.visits().all_visits().unwrap().is_empty());
    assert!(store.predictions().all_predictions().unwrap().is_empty());
}

#[test]
fn test_ensure_schema_twice_in_a_row() {
    let dir = TempDir::new().unwrap();
    let engine = ParquetEngine::new(dir.path());
    for table in TableName::ALL {
        engine.ensure_schema(table).unwrap();
        engine.ensure_schema(table).unwrap();
    }
    let tables: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(tables.len(), 2);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_sessions_lose_no_records() {
    const SESSIONS: usize = 4;
    const PER_SESSION: usize = 5;

    let dir = TempDir::new().unwrap();
    open_store(&dir);
    let barrier = Arc::new(Barrier::new(SESSIONS));

    let handles: Vec<_> = (0..SESSIONS)
        .map(|session| {
            // Each session gets its own engine, as a separate process would.
            let path = dir.path().to_path_buf();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let store = TelemetryStore::open(Arc::new(ParquetEngine::new(path))).unwrap();
                barrier.wait();
                for i in 0..PER_SESSION {
                    store
                        .predictions()
                        .record_prediction(
                            format!("session {} message {}", session, i),
                            "neutral",
                            0.5,
                            IstTimestamp::now(),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let store = open_store(&dir);
    let texts: HashSet<String> = store
        .predictions()
        .all_predictions()
        .unwrap()
        .into_iter()
        .map(|p| p.text)
        .collect();
    assert_eq!(texts.len(), SESSIONS * PER_SESSION);
    for session in 0..SESSIONS {
        for i in 0..PER_SESSION {
            assert!(texts.contains(&format!("session {} message {}", session, i)));
        }
    }

    // Per-session order is still insertion order.
    let all = store.predictions().all_predictions().unwrap();
    for session in 0..SESSIONS {
        let prefix = format!("session {} ", session);
        let own: Vec<_> = all
            .iter()
            .filter(|p| p.text.starts_with(&prefix))
            .map(|p| p.text.clone())
            .collect();
        let expected: Vec<_> = (0..PER_SESSION)
            .map(|i| format!("session {} message {}", session, i))
            .collect();
        assert_eq!(own, expected);
    }
}

#[test]
fn test_insert_fails_under_lock_contention() {
    let dir = TempDir::new().unwrap();
    let engine = ParquetEngine::new(dir.path()).with_lock_timeout(Duration::from_millis(200));
    let store = TelemetryStore::open(Arc::new(engine.clone())).unwrap();

    let lock_path = engine.table_dir(TableName::PageVisited).join(".lock");
    let held = TableLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT).unwrap();

    let (tx, rx) = mpsc::channel();
    let writer = store.clone();
    thread::spawn(move || {
        let result = writer.visits().record_visit("Home", IstTimestamp::now());
        let _ = tx.send(result.map_err(em_common::Error::from));
    });

    let result = rx
        .recv_timeout(Duration::from_secs(3))
        .expect("insert must not block while another writer holds the lock");
    let err = result.unwrap_err();
    assert_eq!(err.code(), 60);
    assert!(matches!(err, em_common::Error::StorageUnavailable(_)));

    drop(held);
    assert!(store.visits().all_visits().unwrap().is_empty());
}

// ============================================================================
// Unavailable medium
// ============================================================================

#[test]
fn test_unusable_table_surfaces_storage_unavailable() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    store.visits().record_visit("Home", ts(7, 0)).unwrap();

    // Replace the table directory with a plain file.
    let table_dir = dir.path().join(TableName::PageVisited.as_str());
    fs::remove_dir_all(&table_dir).unwrap();
    fs::write(&table_dir, b"not a table").unwrap();

    let err = em_common::Error::from(
        store
            .visits()
            .record_visit("Monitor", ts(7, 5))
            .unwrap_err(),
    );
    assert_eq!(err.code(), 60);
    assert!(matches!(err, em_common::Error::StorageUnavailable(_)));

    let err = em_common::Error::from(store.visits().all_visits().unwrap_err());
    assert_eq!(err.code(), 60);

    assert!(table_dir.is_file());
    assert_eq!(fs::read(&table_dir).unwrap(), b"not a table");
    assert!(store.predictions().all_predictions().unwrap().is_empty());
}

// ============================================================================
// On-disk layout
// ============================================================================

#[test]
fn test_segment_columns_on_disk() {
    let dir = TempDir::new().unwrap();
    let engine = ParquetEngine::new(dir.path());
    let store = TelemetryStore::open(Arc::new(engine.clone())).unwrap();
    store
        .predictions()
        .record(&PredictionRecord::new("wow", "surprise", 0.6, ts(10, 0)))
        .unwrap();

    let segments = engine.segment_paths(TableName::EmotionClf).unwrap();
    assert_eq!(segments.len(), 1);

    let file = fs::File::open(&segments[0]).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    let schema = builder.schema().clone();
    let names: Vec<_> = schema.fields().iter().map(|f| f.name().clone()).collect();
    assert_eq!(names, ["rawtext", "prediction", "probability", "time_of_visit"]);
    assert_eq!(
        schema.field_with_name("time_of_visit").unwrap().data_type(),
        &DataType::Timestamp(TimeUnit::Microsecond, Some("+05:30".into()))
    );
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_scan_preserves_insertion_order(
        pages in proptest::collection::vec("[A-Za-z]{1,8}", 0..12)
    ) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        for (i, page) in pages.iter().enumerate() {
            store.visits().record_visit(page.clone(), ts(0, i as u32)).unwrap();
        }

        let visits = store.visits().all_visits().unwrap();
        let stored: Vec<_> = visits.iter().map(|v| v.page_name.clone()).collect();
        prop_assert_eq!(stored, pages);
        for (i, visit) in visits.iter().enumerate() {
            prop_assert_eq!(visit.visit_time, ts(0, i as u32));
        }
    }
}
