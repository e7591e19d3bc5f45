//! Progress callbacks emitted while a catalog is walked.
//!
//! The library never draws anything itself. The CLI plugs an indicatif-backed
//! reporter in; tests and embedders use [`NoProgress`] or their own recorder.

use std::time::Duration;

use crate::catalog::CatalogEntry;
use crate::download::{TransferAttempt, TransferError};
use crate::validate::FileState;

/// Observer of walker, retry and transfer events. All methods default to no-ops.
#[allow(unused_variables)]
pub trait ProgressReporter: Send + Sync {
    /// An entry is about to be processed; `state` is its classification on disk.
    fn entry_started(&self, index: usize, total: usize, entry: &CatalogEntry, state: FileState) {}

    /// The entry was already valid and will not be fetched.
    fn entry_skipped(&self, entry: &CatalogEntry) {}

    /// Bytes on disk for the entry in flight, with the expected total when known.
    fn bytes(&self, entry: &CatalogEntry, done: u64, total: Option<u64>) {}

    /// A failed attempt will be retried after `delay`.
    fn retry_scheduled(&self, entry: &CatalogEntry, next_attempt: u32, delay: Duration, reason: &TransferError) {}

    /// The retry loop for the entry resolved with `attempt` as its final attempt.
    fn entry_finished(&self, entry: &CatalogEntry, attempt: &TransferAttempt) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}
