//! Prediction log.

use std::sync::Arc;

use em_common::IstTimestamp;

use crate::engine::{StorageEngine, StoreError};
use crate::record::{self, PredictionRecord};

/// Typed view of `emotion_clf_table`.
#[derive(Clone)]
pub struct PredictionLog {
    engine: Arc<dyn StorageEngine>,
}

impl PredictionLog {
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        PredictionLog { engine }
    }

    /// Record a classification. `confidence` is stored as given.
    pub fn record_prediction(
        &self,
        text: impl Into<String>,
        label: impl Into<String>,
        confidence: f64,
        at: IstTimestamp,
    ) -> Result<PredictionRecord, StoreError> {
        let record = PredictionRecord::new(text, label, confidence, at);
        self.record(&record)?;
        Ok(record)
    }

    /// Insert an already-built record.
    pub fn record(&self, record: &PredictionRecord) -> Result<(), StoreError> {
        record::append(self.engine.as_ref(), record)
    }

    /// Every prediction, in insertion order.
    pub fn all_predictions(&self) -> Result<Vec<PredictionRecord>, StoreError> {
        record::scan(self.engine.as_ref())
    }
}
