//! Catalog walker: sequential per-entry skip-or-fetch loop.
//!
//! Entries are processed one at a time in catalog order. An entry that is
//! already valid on disk is counted as skipped without any network traffic or
//! delay; every other entry goes through the [`RetryScheduler`], followed by
//! the inter-entry delay when more entries remain.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::catalog::{Catalog, CatalogEntry, EntryFilter};
use crate::download::{RetryScheduler, TransferOutcome, constants::DEFAULT_INTER_ENTRY_DELAY};
use crate::progress::{NoProgress, ProgressReporter};
use crate::report::{RunReport, RunReportBuilder};
use crate::validate;

/// Which counter a successful fetch increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Normal run: successes count as `downloaded`.
    Download,
    /// Check pass: successes count as `repaired`.
    Repair,
}

/// Drives the retry scheduler over a catalog.
#[derive(Clone)]
pub struct CatalogWalker {
    scheduler: RetryScheduler,
    inter_delay: Duration,
    progress: Arc<dyn ProgressReporter>,
}

impl std::fmt::Debug for CatalogWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogWalker")
            .field("scheduler", &self.scheduler)
            .field("inter_delay", &self.inter_delay)
            .finish_non_exhaustive()
    }
}

impl CatalogWalker {
    /// Creates a walker with the default inter-entry delay and no progress output.
    #[must_use]
    pub fn new(scheduler: RetryScheduler) -> Self {
        Self {
            scheduler,
            inter_delay: DEFAULT_INTER_ENTRY_DELAY,
            progress: Arc::new(NoProgress),
        }
    }

    /// Sets the pause after each entry that touched the network.
    #[must_use]
    pub fn with_delay(mut self, inter_delay: Duration) -> Self {
        self.inter_delay = inter_delay;
        self
    }

    /// Sets the progress reporter.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Walks the entries of `catalog` accepted by `filter`, recording into `report`.
    ///
    /// Entries rejected by the filter are never classified and never recorded.
    pub async fn run(&self, catalog: &Catalog, filter: &EntryFilter, report: &mut RunReportBuilder) {
        let selected: Vec<&CatalogEntry> = catalog.filtered(filter).collect();
        debug!(selected = selected.len(), catalog = catalog.len(), "filter applied");
        self.run_entries(&selected, WalkMode::Download, report).await;
    }

    /// Convenience wrapper around [`run`](Self::run) returning the finished report.
    pub async fn run_catalog(&self, catalog: &Catalog, filter: &EntryFilter) -> RunReport {
        let mut report = RunReportBuilder::new();
        self.run(catalog, filter, &mut report).await;
        report.build()
    }

    /// Processes `entries` in order under `mode`.
    #[instrument(skip(self, entries, report), fields(entries = entries.len()))]
    pub async fn run_entries(&self, entries: &[&CatalogEntry], mode: WalkMode, report: &mut RunReportBuilder) {
        let shutdown = self.scheduler.shutdown();
        let total = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            if shutdown.is_triggered() {
                report.mark_interrupted();
                break;
            }

            let state = validate::classify(&entry.destination, entry.kind);
            self.progress.entry_started(index, total, entry, state);
            if state.is_valid() {
                debug!(name = %entry.display_name, "already valid; skipping");
                report.record_skipped();
                self.progress.entry_skipped(entry);
                continue;
            }

            info!(
                index = index + 1,
                total,
                name = %entry.display_name,
                %state,
                "processing entry"
            );
            let attempt = self.scheduler.run(entry, self.progress.as_ref()).await;
            self.progress.entry_finished(entry, &attempt);

            match &attempt.outcome {
                TransferOutcome::Completed | TransferOutcome::RangeResumed => {
                    let resumed = matches!(attempt.outcome, TransferOutcome::RangeResumed);
                    match mode {
                        WalkMode::Download => report.record_downloaded(resumed),
                        WalkMode::Repair => report.record_repaired(resumed),
                    }
                }
                TransferOutcome::Failed(error) if error.is_interrupted() => {
                    warn!(name = %entry.display_name, "run interrupted; partial bytes kept for resume");
                    report.mark_interrupted();
                    break;
                }
                TransferOutcome::Failed(error) => report.record_failed(entry, error),
            }

            if index + 1 < total && !shutdown.sleep(self.inter_delay).await {
                report.mark_interrupted();
                break;
            }
        }
    }
}
