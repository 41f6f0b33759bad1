//! Run-level types.

use std::collections::{BTreeMap, BTreeSet};

use catalog_core::RecordDiagnostics;
use catalog_schema::CanonicalProduct;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Result of pushing one raw record through the pipeline.
#[derive(Debug, Clone)]
pub struct RecordOutcome {
    /// `None` when the record was rejected.
    pub product: Option<CanonicalProduct>,
    pub diagnostics: RecordDiagnostics,
}

/// Everything a run produced, in input order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of input records.
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Records never scheduled because the run stopped early.
    pub skipped: usize,
    pub cancelled: bool,
    /// Accepted products, ordered by input position.
    #[serde(skip)]
    pub products: Vec<CanonicalProduct>,
    /// Category of every accepted product with its sorted sub-categories.
    pub categories: BTreeMap<String, BTreeSet<String>>,
    /// One entry per processed record, ordered by input position.
    pub diagnostics: Vec<RecordDiagnostics>,
}

impl RunReport {
    pub(crate) fn new(total: usize) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            total,
            accepted: 0,
            rejected: 0,
            skipped: 0,
            cancelled: false,
            products: Vec::new(),
            categories: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, outcome: RecordOutcome) {
        match outcome.product {
            Some(product) => {
                self.accepted += 1;
                self.add_category(&product);
                self.products.push(product);
            }
            None => self.rejected += 1,
        }
        self.diagnostics.push(outcome.diagnostics);
    }

    fn add_category(&mut self, product: &CanonicalProduct) {
        let record = product.record();
        let category = record.category.trim();
        if category.is_empty() {
            return;
        }
        let subs = self.categories.entry(category.to_string()).or_default();
        let sub_category = record.sub_category.trim();
        if !sub_category.is_empty() {
            subs.insert(sub_category.to_string());
        }
    }

    pub(crate) fn finish(&mut self) {
        self.skipped = self.total - self.diagnostics.len();
        self.finished_at = Utc::now();
    }
}

/// Run-level failure. Carries whatever was completed before the run stopped.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Translation service unavailable: {reason}")]
    ServiceUnavailable {
        reason: String,
        report: Box<RunReport>,
    },
}

impl RunError {
    pub fn report(&self) -> &RunReport {
        match self {
            Self::ServiceUnavailable { report, .. } => report,
        }
    }

    pub fn into_report(self) -> RunReport {
        match self {
            Self::ServiceUnavailable { report, .. } => *report,
        }
    }
}
