//! Run summary threaded through the walker and the audit coordinator.
//!
//! Components receive a `&mut RunReportBuilder`, record outcomes into it, and
//! the caller takes an immutable [`RunReport`] snapshot at the end.

use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::download::TransferError;

/// An entry that is still not valid after its retry loop ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    /// The entry that failed.
    pub entry: CatalogEntry,
    /// Display text of the last error.
    pub reason: String,
}

/// Accumulated outcome of a walk or a check pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Entries fetched in download mode.
    pub downloaded: usize,
    /// Entries already valid on disk; no network traffic was generated for them.
    pub skipped: usize,
    /// Entries fetched in repair mode.
    pub repaired: usize,
    /// Successful transfers that continued a partial file.
    pub resumed: usize,
    /// Entries that exhausted their retries or hit an unrecoverable error.
    pub failed: Vec<FailedEntry>,
    /// True when a shutdown request stopped the run before the catalog ended.
    pub interrupted: bool,
}

impl RunReport {
    /// Entries that ended valid because of this run.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.downloaded + self.repaired
    }

    /// Entries that reached a terminal state in this run.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded() + self.skipped + self.failed.len()
    }

    /// True when nothing failed and the run was not interrupted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }
}

/// Mutable accumulator for a [`RunReport`].
#[derive(Debug, Default)]
pub struct RunReportBuilder {
    report: RunReport,
}

impl RunReportBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a fetched entry in download mode.
    pub fn record_downloaded(&mut self, resumed: bool) {
        self.report.downloaded += 1;
        self.report.resumed += usize::from(resumed);
    }

    /// Counts a fetched entry in repair mode.
    pub fn record_repaired(&mut self, resumed: bool) {
        self.report.repaired += 1;
        self.report.resumed += usize::from(resumed);
    }

    /// Counts an entry that was already valid.
    pub fn record_skipped(&mut self) {
        self.report.skipped += 1;
    }

    /// Records an entry whose retry loop ended in failure.
    pub fn record_failed(&mut self, entry: &CatalogEntry, error: &TransferError) {
        self.report.failed.push(FailedEntry {
            entry: entry.clone(),
            reason: error.to_string(),
        });
    }

    /// Marks the run as stopped by a shutdown request.
    pub fn mark_interrupted(&mut self) {
        self.report.interrupted = true;
    }

    /// Returns the report accumulated so far.
    #[must_use]
    pub fn snapshot(&self) -> RunReport {
        self.report.clone()
    }

    /// Consumes the builder.
    #[must_use]
    pub fn build(self) -> RunReport {
        self.report
    }
}
