//! Page-visit log.

use std::collections::BTreeMap;
use std::sync::Arc;

use em_common::IstTimestamp;
use serde::{Deserialize, Serialize};

use crate::engine::{StorageEngine, StoreError};
use crate::record::{self, PageVisitRecord};

/// Visit count of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCount {
    pub page_name: String,
    pub count: u64,
    /// Share of all visits, in [0, 1].
    pub proportion: f64,
}

/// Typed view of `page_visited_table`.
#[derive(Clone)]
pub struct PageVisitLog {
    engine: Arc<dyn StorageEngine>,
}

impl PageVisitLog {
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        PageVisitLog { engine }
    }

    /// Record a render of `page_name` at `at`. Any page name is accepted.
    pub fn record_visit(
        &self,
        page_name: impl Into<String>,
        at: IstTimestamp,
    ) -> Result<PageVisitRecord, StoreError> {
        let record = PageVisitRecord::new(page_name, at);
        self.record(&record)?;
        Ok(record)
    }

    /// Insert an already-built record.
    pub fn record(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
        record::append(self.engine.as_ref(), record)
    }

    /// Every visit, in insertion order.
    pub fn all_visits(&self) -> Result<Vec<PageVisitRecord>, StoreError> {
        record::scan(self.engine.as_ref())
    }

    /// Visits per page name. Pages never visited are absent.
    pub fn visit_counts_by_page(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        Ok(count_by_page(&self.all_visits()?))
    }

    /// Visit counts ordered by descending count, ties by page name.
    pub fn ranked_visit_counts(&self) -> Result<Vec<PageCount>, StoreError> {
        Ok(rank(count_by_page(&self.all_visits()?)))
    }
}

/// Count visits per page name.
pub fn count_by_page(visits: &[PageVisitRecord]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for visit in visits {
        *counts.entry(visit.page_name.clone()).or_insert(0) += 1;
    }
    counts
}

/// Order counts by descending count, ties by page name.
pub fn rank(counts: BTreeMap<String, u64>) -> Vec<PageCount> {
    let total: u64 = counts.values().sum();
    let mut ranked: Vec<PageCount> = counts
        .into_iter()
        .map(|(page_name, count)| PageCount {
            page_name,
            count,
            proportion: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
        })
        .collect();
    // BTreeMap iteration is already name-ordered; stable sort keeps it for ties.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked
}
