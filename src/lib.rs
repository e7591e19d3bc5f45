//! eduvault core library
//!
//! Resumable download, validation and audit engine for large catalogs of
//! remote files (textbooks, teachers' guides, listening audio). Every run
//! recomputes its resume state from the bytes on disk, so repeating a
//! command is cheap and deleting a damaged file always self-heals.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`validate`] - classifies files on disk as absent/valid/partial/corrupt
//! - [`download`] - transfer unit (range resume, streaming writes) and retry scheduler
//! - [`walker`] - sequential catalog walk with skip-if-valid and inter-entry delay
//! - [`audit`] - read-only audit and the repair (`check`) pass
//! - [`catalog`] - catalog entries, filters and the resolver seam
//! - [`report`] - run summary threaded through the components
//! - [`index`] - HTML index page of the catalog
//! - [`shutdown`] / [`progress`] - interrupt signal and progress callbacks

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod catalog;
pub mod download;
pub mod index;
pub mod progress;
pub mod report;
pub mod shutdown;
#[cfg(test)]
pub mod test_support;
pub mod user_agent;
pub mod validate;
pub mod walker;

// Re-export commonly used types
pub use audit::{AuditRow, AuditSummary, audit, check, repair};
pub use catalog::{Catalog, CatalogEntry, CatalogResolver, EntryFilter, ManifestResolver, ResolveError};
pub use download::{
    ClientConfig, HttpClient, RetryDecision, RetryPolicy, RetryScheduler, TransferAttempt, TransferError,
    TransferOutcome,
};
pub use index::render_index;
pub use progress::{NoProgress, ProgressReporter};
pub use report::{FailedEntry, RunReport, RunReportBuilder};
pub use shutdown::ShutdownSignal;
pub use validate::{FileKind, FileState, classify};
pub use walker::{CatalogWalker, WalkMode};
