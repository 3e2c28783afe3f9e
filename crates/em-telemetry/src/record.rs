//! Typed records and their Arrow encoding.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, RecordBatch, StringArray, TimestampMicrosecondArray,
};
use arrow::error::ArrowError;
use em_common::{EmotionLabel, IstTimestamp, IST_TZ};
use serde::{Deserialize, Serialize};

use crate::engine::{StorageEngine, StoreError};
use crate::schema::TableName;

/// A row type stored in exactly one table.
pub trait TableRecord: Sized {
    const TABLE: TableName;

    /// Encode `records` as one batch in the table schema.
    fn batch_of(records: &[Self]) -> Result<RecordBatch, ArrowError>;

    /// Decode every row of `batch`.
    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError>;

    /// Encode a single record.
    fn to_batch(&self) -> Result<RecordBatch, ArrowError> {
        Self::batch_of(std::slice::from_ref(self))
    }
}

/// One page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisitRecord {
    pub page_name: String,
    pub visit_time: IstTimestamp,
}

impl PageVisitRecord {
    pub fn new(page_name: impl Into<String>, visit_time: IstTimestamp) -> Self {
        PageVisitRecord {
            page_name: page_name.into(),
            visit_time,
        }
    }
}

impl TableRecord for PageVisitRecord {
    const TABLE: TableName = TableName::PageVisited;

    fn batch_of(records: &[Self]) -> Result<RecordBatch, ArrowError> {
        let pagename: ArrayRef = Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.page_name.as_str()),
        ));
        let visit_time: ArrayRef = Arc::new(timestamps(records.iter().map(|r| r.visit_time)));
        RecordBatch::try_new(Self::TABLE.schema(), vec![pagename, visit_time])
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError> {
        let pagename = string_column(batch, Self::TABLE, "pagename")?;
        let visit_time = timestamp_column(batch, Self::TABLE, "visit_time")?;
        (0..batch.num_rows())
            .map(|i| {
                Ok(PageVisitRecord {
                    page_name: pagename.value(i).to_string(),
                    visit_time: timestamp_at(visit_time, Self::TABLE, i)?,
                })
            })
            .collect()
    }
}

/// One successful classification.
///
/// `probability` is whatever the caller supplied; the store does not check
/// it against any distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub text: String,
    pub prediction: String,
    pub probability: f64,
    pub time: IstTimestamp,
}

impl PredictionRecord {
    pub fn new(
        text: impl Into<String>,
        prediction: impl Into<String>,
        probability: f64,
        time: IstTimestamp,
    ) -> Self {
        PredictionRecord {
            text: text.into(),
            prediction: prediction.into(),
            probability,
            time,
        }
    }

    /// The stored prediction as a known label, if it is one.
    pub fn label(&self) -> Option<EmotionLabel> {
        self.prediction.parse().ok()
    }
}

impl TableRecord for PredictionRecord {
    const TABLE: TableName = TableName::EmotionClf;

    fn batch_of(records: &[Self]) -> Result<RecordBatch, ArrowError> {
        let rawtext: ArrayRef = Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.text.as_str()),
        ));
        let prediction: ArrayRef = Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.prediction.as_str()),
        ));
        let probability: ArrayRef = Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.probability),
        ));
        let time_of_visit: ArrayRef = Arc::new(timestamps(records.iter().map(|r| r.time)));
        RecordBatch::try_new(
            Self::TABLE.schema(),
            vec![rawtext, prediction, probability, time_of_visit],
        )
    }

    fn from_batch(batch: &RecordBatch) -> Result<Vec<Self>, StoreError> {
        let rawtext = string_column(batch, Self::TABLE, "rawtext")?;
        let prediction = string_column(batch, Self::TABLE, "prediction")?;
        let probability = column::<Float64Array>(batch, Self::TABLE, "probability")?;
        let time_of_visit = timestamp_column(batch, Self::TABLE, "time_of_visit")?;
        (0..batch.num_rows())
            .map(|i| {
                Ok(PredictionRecord {
                    text: rawtext.value(i).to_string(),
                    prediction: prediction.value(i).to_string(),
                    probability: probability.value(i),
                    time: timestamp_at(time_of_visit, Self::TABLE, i)?,
                })
            })
            .collect()
    }
}

/// Encode and insert one record.
pub(crate) fn append<R: TableRecord>(
    engine: &dyn StorageEngine,
    record: &R,
) -> Result<(), StoreError> {
    let batch = record.to_batch()?;
    engine.insert(R::TABLE, &batch)
}

/// Scan and decode every record of `R`'s table, oldest first.
pub(crate) fn scan<R: TableRecord>(engine: &dyn StorageEngine) -> Result<Vec<R>, StoreError> {
    let mut records = Vec::new();
    for batch in engine.scan_all(R::TABLE)? {
        records.extend(R::from_batch(&batch)?);
    }
    Ok(records)
}

fn timestamps(values: impl Iterator<Item = IstTimestamp>) -> TimestampMicrosecondArray {
    TimestampMicrosecondArray::from_iter_values(values.map(|ts| ts.timestamp_micros()))
        .with_timezone(IST_TZ)
}

fn column<'a, A: Array + 'static>(
    batch: &'a RecordBatch,
    table: TableName,
    name: &str,
) -> Result<&'a A, StoreError> {
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::CorruptRecord {
            table,
            reason: format!("missing column {}", name),
        })?;
    if array.null_count() > 0 {
        return Err(StoreError::CorruptRecord {
            table,
            reason: format!("null values in column {}", name),
        });
    }
    array
        .as_any()
        .downcast_ref::<A>()
        .ok_or_else(|| StoreError::CorruptRecord {
            table,
            reason: format!("column {} has type {}", name, array.data_type()),
        })
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    table: TableName,
    name: &str,
) -> Result<&'a StringArray, StoreError> {
    column::<StringArray>(batch, table, name)
}

fn timestamp_column<'a>(
    batch: &'a RecordBatch,
    table: TableName,
    name: &str,
) -> Result<&'a TimestampMicrosecondArray, StoreError> {
    column::<TimestampMicrosecondArray>(batch, table, name)
}

fn timestamp_at(
    array: &TimestampMicrosecondArray,
    table: TableName,
    i: usize,
) -> Result<IstTimestamp, StoreError> {
    let micros = array.value(i);
    IstTimestamp::from_micros(micros).ok_or_else(|| StoreError::CorruptRecord {
        table,
        reason: format!("timestamp {} out of range", micros),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_visit_batch_roundtrip() {
        let records = vec![
            PageVisitRecord::new("Home", IstTimestamp::now()),
            PageVisitRecord::new("Monitor", IstTimestamp::now()),
        ];
        let batch = PageVisitRecord::batch_of(&records).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(PageVisitRecord::from_batch(&batch).unwrap(), records);
    }

    #[test]
    fn test_prediction_batch_keeps_probability_exact() {
        let record =
            PredictionRecord::new("so happy", "happy", 0.812_345_678_9, IstTimestamp::now());
        let batch = record.to_batch().unwrap();
        let back = PredictionRecord::from_batch(&batch).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].probability.to_bits(), record.probability.to_bits());
        assert_eq!(back[0], record);
    }

    #[test]
    fn test_label_parsing() {
        let known = PredictionRecord::new("x", "fear", 0.5, IstTimestamp::now());
        assert_eq!(known.label(), Some(EmotionLabel::Fear));
        let unknown = PredictionRecord::new("x", "boredom", 0.5, IstTimestamp::now());
        assert_eq!(unknown.label(), None);
    }

    #[test]
    fn test_from_batch_rejects_wrong_table() {
        let batch = PageVisitRecord::new("Home", IstTimestamp::now())
            .to_batch()
            .unwrap();
        let err = PredictionRecord::from_batch(&batch).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { .. }));
    }
}
