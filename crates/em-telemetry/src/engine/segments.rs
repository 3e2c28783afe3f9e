//! Durable Parquet-backed engine.
//!
//! Layout under the base directory:
//!
//! ```text
//! <base>/<table>/_schema.json               written once by ensure_schema
//! <base>/<table>/.lock                      exclusive flock for writers
//! <base>/<table>/00000000000000000001.parquet
//! <base>/<table>/00000000000000000002.parquet
//! ```
//!
//! Every insert becomes one segment. The sequence number is allocated
//! under the table lock as one past the highest published segment, the
//! segment is written to a temp file, fsynced, and renamed into place, so
//! a scan sees either the whole record or none of it and concurrent
//! writers never reuse a number.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arrow::array::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{WriterProperties, WriterVersion};

use super::{check_batch_schema, StorageEngine, StoreError};
use crate::lock::{TableLock, DEFAULT_LOCK_TIMEOUT};
use crate::schema::{SchemaManifest, TableName};

const MANIFEST_FILENAME: &str = "_schema.json";
const LOCK_FILENAME: &str = ".lock";
const SEGMENT_EXTENSION: &str = "parquet";

/// Engine storing each table as a directory of Parquet segments.
#[derive(Debug, Clone)]
pub struct ParquetEngine {
    base_dir: PathBuf,
    compression: Compression,
    lock_timeout: Duration,
}

impl ParquetEngine {
    /// Engine rooted at `base_dir`. Nothing is touched until `ensure_schema`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        ParquetEngine {
            base_dir: base_dir.into(),
            compression: Compression::ZSTD(ZstdLevel::default()),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// How long a writer waits on a contended table lock before failing.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Directory holding the segments of `table`.
    pub fn table_dir(&self, table: TableName) -> PathBuf {
        self.base_dir.join(table.as_str())
    }

    /// Published segments of `table`, oldest first.
    pub fn segment_paths(&self, table: TableName) -> io::Result<Vec<PathBuf>> {
        Ok(list_segments(&self.table_dir(table))?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    fn require_schema(&self, table: TableName) -> Result<PathBuf, StoreError> {
        let dir = self.table_dir(table);
        if dir.join(MANIFEST_FILENAME).is_file() {
            Ok(dir)
        } else {
            Err(StoreError::SchemaMissing(table))
        }
    }

    fn write_segment(
        &self,
        table: TableName,
        path: &Path,
        batch: &RecordBatch,
    ) -> Result<(), StoreError> {
        let unavailable = |source| StoreError::Unavailable { table, source };
        let file = File::create(path).map_err(unavailable)?;

        let props = WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .set_compression(self.compression)
            .set_dictionary_enabled(true)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(batch)?;
        let file = writer.into_inner()?;
        file.sync_all().map_err(unavailable)?;
        Ok(())
    }

    fn publish(&self, table: TableName, batch: &RecordBatch) -> Result<PathBuf, StoreError> {
        let dir = self.require_schema(table)?;
        let unavailable = |source| StoreError::Unavailable { table, source };

        let _lock =
            TableLock::acquire(&dir.join(LOCK_FILENAME), self.lock_timeout).map_err(unavailable)?;

        let seq = list_segments(&dir)
            .map_err(unavailable)?
            .last()
            .map_or(1, |(seq, _)| seq + 1);
        let final_path = dir.join(segment_name(seq));
        let temp_path = final_path.with_extension("parquet.tmp");

        if let Err(err) = self.write_segment(table, &temp_path, batch) {
            let _ = fs::remove_file(&temp_path);
            return Err(err);
        }
        fs::rename(&temp_path, &final_path).map_err(unavailable)?;
        sync_dir(&dir).map_err(unavailable)?;

        Ok(final_path)
    }
}

impl StorageEngine for ParquetEngine {
    fn name(&self) -> &'static str {
        "parquet"
    }

    fn ensure_schema(&self, table: TableName) -> Result<(), StoreError> {
        let dir = self.table_dir(table);
        let failed = |reason: String| StoreError::SchemaInitialization { table, reason };

        fs::create_dir_all(&dir)
            .map_err(|e| failed(format!("cannot create {}: {}", dir.display(), e)))?;
        let _lock = TableLock::acquire(&dir.join(LOCK_FILENAME), self.lock_timeout)
            .map_err(|e| failed(format!("cannot lock {}: {}", dir.display(), e)))?;

        let expected = SchemaManifest::for_table(table);
        let manifest_path = dir.join(MANIFEST_FILENAME);

        if manifest_path.is_file() {
            let content = fs::read_to_string(&manifest_path)
                .map_err(|e| failed(format!("cannot read manifest: {}", e)))?;
            let found: SchemaManifest = serde_json::from_str(&content)
                .map_err(|e| failed(format!("unreadable manifest: {}", e)))?;
            if found != expected {
                return Err(failed(format!(
                    "manifest conflict: found schema version {} with {} columns, \
                     expected {} with {}",
                    found.schema_version,
                    found.fields.len(),
                    expected.schema_version,
                    expected.fields.len()
                )));
            }
            tracing::debug!(table = %table, "schema already present");
            return Ok(());
        }

        let json = serde_json::to_string_pretty(&expected)
            .map_err(|e| failed(format!("cannot encode manifest: {}", e)))?;
        let temp_path = manifest_path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .and_then(|_| fs::rename(&temp_path, &manifest_path))
            .and_then(|_| sync_dir(&dir))
            .map_err(|e| failed(format!("cannot write manifest: {}", e)))?;

        tracing::info!(table = %table, dir = %dir.display(), "created table");
        Ok(())
    }

    fn insert(&self, table: TableName, batch: &RecordBatch) -> Result<(), StoreError> {
        check_batch_schema(table, batch)?;
        match self.publish(table, batch) {
            Ok(path) => {
                tracing::debug!(
                    table = %table,
                    rows = batch.num_rows(),
                    segment = %path.display(),
                    "inserted"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(table = %table, error = %err, "insert failed");
                Err(err)
            }
        }
    }

    fn scan_all(&self, table: TableName) -> Result<Vec<RecordBatch>, StoreError> {
        let dir = self.require_schema(table)?;
        let segments =
            list_segments(&dir).map_err(|source| StoreError::Unavailable { table, source })?;

        let mut batches = Vec::with_capacity(segments.len());
        for (_, path) in segments {
            let file =
                File::open(&path).map_err(|source| StoreError::Unavailable { table, source })?;
            let corrupt = |source| StoreError::CorruptSegment {
                table,
                path: path.clone(),
                source,
            };
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)
                .and_then(|builder| builder.build())
                .map_err(corrupt)?;
            for batch in reader {
                batches.push(batch?);
            }
        }

        tracing::debug!(table = %table, batches = batches.len(), "scanned");
        Ok(batches)
    }
}

/// File name of segment `seq`.
fn segment_name(seq: u64) -> String {
    format!("{:020}.{}", seq, SEGMENT_EXTENSION)
}

/// Sequence number of a published segment, or None for any other file.
fn segment_seq(path: &Path) -> Option<u64> {
    if path.extension()? != SEGMENT_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    if stem.len() != 20 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// Published segments in `dir`, sorted by sequence number.
fn list_segments(dir: &Path) -> io::Result<Vec<(u64, PathBuf)>> {
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(seq) = segment_seq(&path) {
            segments.push((seq, path));
        }
    }
    segments.sort_by_key(|(seq, _)| *seq);
    Ok(segments)
}

/// Persist directory entries (renames) to disk.
fn sync_dir(dir: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        File::open(dir)?.sync_all()?;
    }
    #[cfg(not(unix))]
    let _ = dir;
    Ok(())
}
