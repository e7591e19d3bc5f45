//! Audit/repair coordinator (the `--check` pass).
//!
//! [`audit`] classifies every selected catalog entry without touching the
//! network. [`repair`] builds the repair set from those rows and hands it to
//! the walker in [`WalkMode::Repair`]; entries already valid are counted as
//! skipped and never fetched. [`check`] runs both.

use serde::Serialize;
use tracing::{info, instrument};

use crate::catalog::{Catalog, CatalogEntry, EntryFilter};
use crate::report::{RunReport, RunReportBuilder};
use crate::validate::{self, FileState};
use crate::walker::{CatalogWalker, WalkMode};

/// Disk state of one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    /// The audited entry.
    pub entry: CatalogEntry,
    /// Classification of the bytes at its destination.
    pub state: FileState,
    /// Bytes held locally (the staging file counts for staged kinds).
    pub size: Option<u64>,
}

/// Per-state tallies of an audit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    /// Entries whose bytes pass validation.
    pub valid: usize,
    /// Entries with a resumable prefix on disk.
    pub partial: usize,
    /// Entries whose bytes must be discarded.
    pub corrupt: usize,
    /// Entries with nothing on disk.
    pub absent: usize,
}

impl AuditSummary {
    /// Tallies `rows`.
    #[must_use]
    pub fn from_rows(rows: &[AuditRow]) -> Self {
        rows.iter().fold(Self::default(), |mut summary, row| {
            match row.state {
                FileState::Valid => summary.valid += 1,
                FileState::Partial => summary.partial += 1,
                FileState::Corrupt => summary.corrupt += 1,
                FileState::Absent => summary.absent += 1,
            }
            summary
        })
    }

    /// Entries that need a fetch.
    #[must_use]
    pub fn needs_repair(&self) -> usize {
        self.partial + self.corrupt + self.absent
    }
}

/// Classifies every entry of `catalog` accepted by `filter`, in catalog order.
#[must_use]
pub fn audit(catalog: &Catalog, filter: &EntryFilter) -> Vec<AuditRow> {
    catalog
        .filtered(filter)
        .map(|entry| AuditRow {
            entry: entry.clone(),
            state: validate::classify(&entry.destination, entry.kind),
            size: validate::local_size(&entry.destination, entry.kind),
        })
        .collect()
}

/// Re-validates the catalog on disk and repairs every entry that is not valid.
pub async fn check(catalog: &Catalog, filter: &EntryFilter, walker: &CatalogWalker) -> RunReport {
    let rows = audit(catalog, filter);
    repair(&rows, walker).await
}

/// Repairs the non-valid rows of an earlier [`audit`]; valid rows count as skipped.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn repair(rows: &[AuditRow], walker: &CatalogWalker) -> RunReport {
    let summary = AuditSummary::from_rows(rows);
    info!(
        valid = summary.valid,
        partial = summary.partial,
        corrupt = summary.corrupt,
        absent = summary.absent,
        "audit complete"
    );

    let mut report = RunReportBuilder::new();
    let mut repair_set = Vec::with_capacity(summary.needs_repair());
    for row in rows {
        if row.state.is_valid() {
            report.record_skipped();
        } else {
            repair_set.push(&row.entry);
        }
    }

    walker.run_entries(&repair_set, WalkMode::Repair, &mut report).await;
    report.build()
}
