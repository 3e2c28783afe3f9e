//! The monitor service: page renders, text analysis, and the dashboard.
//!
//! Each user interaction runs one synchronous sequence. An analysis calls
//! the oracle first and writes to the prediction log only if inference
//! succeeded, so a failed classification never leaves a row behind.

use std::sync::Arc;

use em_common::{EmotionLabel, IstTimestamp, MonitorConfig, Page, Result};
use em_telemetry::{PageVisitRecord, StorageEngine, TelemetryStore};
use serde::Serialize;

use crate::dashboard::Dashboard;
use crate::inference::{ClassDistribution, ClassificationOracle, LexiconOracle};

/// Result of analyzing one text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub text: String,
    pub label: EmotionLabel,
    pub emoji: &'static str,
    /// Maximum of `distribution`; the value stored in the prediction log.
    pub confidence: f64,
    pub distribution: ClassDistribution,
    pub recorded_at: IstTimestamp,
}

/// Telemetry store plus classifier, as used by the UI.
#[derive(Clone)]
pub struct EmotionMonitor {
    store: TelemetryStore,
    oracle: Arc<dyn ClassificationOracle>,
}

impl EmotionMonitor {
    /// Run the startup sequence on `engine`.
    pub fn open(
        engine: Arc<dyn StorageEngine>,
        oracle: Arc<dyn ClassificationOracle>,
    ) -> Result<Self> {
        Ok(Self::with_store(TelemetryStore::open(engine)?, oracle))
    }

    pub fn with_store(store: TelemetryStore, oracle: Arc<dyn ClassificationOracle>) -> Self {
        EmotionMonitor { store, oracle }
    }

    /// Build the store and oracle described by `config`.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let oracle: Arc<dyn ClassificationOracle> = match &config.lexicon_path {
            Some(path) => Arc::new(LexiconOracle::from_json_file(path)?),
            None => Arc::new(LexiconOracle::builtin()),
        };
        let store = TelemetryStore::from_settings(&config.store)?;
        tracing::info!(
            backend = %config.store.backend,
            data_dir = %config.store.data_dir.display(),
            "monitor ready"
        );
        Ok(Self::with_store(store, oracle))
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.store
    }

    pub fn oracle(&self) -> &dyn ClassificationOracle {
        self.oracle.as_ref()
    }

    /// Record a render of `page` now.
    pub fn render(&self, page: Page) -> Result<PageVisitRecord> {
        self.record_visit(page.as_str(), IstTimestamp::now())
    }

    /// Record a render of an arbitrary page name.
    pub fn record_visit(&self, page_name: &str, at: IstTimestamp) -> Result<PageVisitRecord> {
        let record = self.store.visits().record_visit(page_name, at)?;
        tracing::debug!(page = page_name, "page visit recorded");
        Ok(record)
    }

    /// Classify `text` and record the prediction now.
    pub fn analyze(&self, text: &str) -> Result<Analysis> {
        self.analyze_at(text, IstTimestamp::now())
    }

    /// Classify `text` and record the prediction at `at`.
    pub fn analyze_at(&self, text: &str, at: IstTimestamp) -> Result<Analysis> {
        let prediction = match self.oracle.predict(text) {
            Ok(prediction) => prediction,
            Err(err) => {
                tracing::warn!(error = %err, chars = text.chars().count(), "inference failed");
                return Err(err.into());
            }
        };

        self.store.predictions().record_prediction(
            text,
            prediction.label.as_str(),
            prediction.confidence,
            at,
        )?;
        tracing::info!(
            label = %prediction.label,
            confidence = prediction.confidence,
            "prediction recorded"
        );

        Ok(Analysis {
            text: text.to_string(),
            label: prediction.label,
            emoji: prediction.label.emoji(),
            confidence: prediction.confidence,
            distribution: prediction.distribution,
            recorded_at: at,
        })
    }

    /// Snapshot of everything the monitoring view shows.
    pub fn dashboard(&self) -> Result<Dashboard> {
        let visits = self.store.visits().all_visits()?;
        let predictions = self.store.predictions().all_predictions()?;
        Ok(Dashboard::new(visits, predictions))
    }
}
