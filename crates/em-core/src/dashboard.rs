//! Monitoring snapshot.

use std::collections::BTreeMap;

use em_common::{EmotionLabel, IstTimestamp};
use em_telemetry::{count_by_page, rank, PageCount, PageVisitRecord, PredictionRecord};
use serde::Serialize;

/// Everything the monitoring view shows, read in one pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub generated_at: IstTimestamp,
    pub visits: Vec<PageVisitRecord>,
    /// Descending by count, ties by page name.
    pub page_counts: Vec<PageCount>,
    pub predictions: Vec<PredictionRecord>,
    /// Predictions per stored label string.
    pub prediction_counts: BTreeMap<String, u64>,
}

impl Dashboard {
    pub fn new(visits: Vec<PageVisitRecord>, predictions: Vec<PredictionRecord>) -> Self {
        let page_counts = rank(count_by_page(&visits));
        let mut prediction_counts = BTreeMap::new();
        for p in &predictions {
            *prediction_counts.entry(p.prediction.clone()).or_insert(0) += 1;
        }
        Dashboard {
            generated_at: IstTimestamp::now(),
            visits,
            page_counts,
            predictions,
            prediction_counts,
        }
    }

    /// Render as Markdown tables.
    pub fn to_markdown(&self) -> String {
        let mut out = String::from("# Emotion Monitor\n\n");
        out.push_str(&format!("Generated: {}\n\n", self.generated_at));

        out.push_str(&format!("## Page Metrics ({} visits)\n\n", self.visits.len()));
        if self.page_counts.is_empty() {
            out.push_str("_No visits recorded._\n");
        } else {
            out.push_str("| Page | Visits | Share |\n|---|---:|---:|\n");
            for c in &self.page_counts {
                out.push_str(&format!(
                    "| {} | {} | {:.1}% |\n",
                    escape_cell(&c.page_name),
                    c.count,
                    c.proportion * 100.0
                ));
            }
        }

        out.push_str(&format!("\n## Predictions ({})\n\n", self.predictions.len()));
        if self.predictions.is_empty() {
            out.push_str("_No predictions recorded._\n");
        } else {
            out.push_str("| Time | Text | Prediction | Probability |\n|---|---|---|---:|\n");
            for p in &self.predictions {
                let shown = match p.label() {
                    Some(label) => format!("{} {}", label.as_str(), label.emoji()),
                    None => p.prediction.clone(),
                };
                out.push_str(&format!(
                    "| {} | {} | {} | {:.4} |\n",
                    p.time,
                    escape_cell(&p.text),
                    escape_cell(&shown),
                    p.probability
                ));
            }
        }
        out
    }

    /// Count of predictions carrying `label`.
    pub fn predictions_for(&self, label: EmotionLabel) -> u64 {
        self.prediction_counts
            .get(label.as_str())
            .copied()
            .unwrap_or(0)
    }
}

/// Escape a value for a Markdown table cell.
pub fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}
