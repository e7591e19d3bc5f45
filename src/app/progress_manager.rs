//! Progress UI (indicatif bar) for catalog runs.

use std::sync::Arc;
use std::time::Duration;

use eduvault_core::{CatalogEntry, FileState, NoProgress, ProgressReporter, TransferAttempt, TransferError};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

/// Reporter drawing one bar over the selected entries.
pub(crate) struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub(crate) fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for BarProgress {
    fn entry_started(&self, index: usize, total: usize, entry: &CatalogEntry, state: FileState) {
        self.bar.set_length(total as u64);
        self.bar.set_position(index as u64);
        self.bar.set_message(format!("{} ({state})", entry.display_name));
    }

    fn entry_skipped(&self, _entry: &CatalogEntry) {
        self.bar.inc(1);
    }

    fn bytes(&self, entry: &CatalogEntry, done: u64, total: Option<u64>) {
        let amount = match total {
            Some(total) => format!("{} / {}", HumanBytes(done), HumanBytes(total)),
            None => HumanBytes(done).to_string(),
        };
        self.bar.set_message(format!("{} {amount}", entry.display_name));
    }

    fn retry_scheduled(&self, entry: &CatalogEntry, next_attempt: u32, delay: Duration, reason: &TransferError) {
        self.bar.set_message(format!(
            "{} retry {next_attempt} in {}s: {reason}",
            entry.display_name,
            delay.as_secs()
        ));
    }

    fn entry_finished(&self, _entry: &CatalogEntry, _attempt: &TransferAttempt) {
        self.bar.inc(1);
    }
}

/// Returns the bar reporter when requested, otherwise a silent one.
/// The bar handle is returned separately so the caller can clear it.
pub(crate) fn build_progress(
    use_bar: bool,
    total: usize,
) -> (Arc<dyn ProgressReporter>, Option<Arc<BarProgress>>) {
    if !use_bar {
        return (Arc::new(NoProgress), None);
    }
    let bar = Arc::new(BarProgress::new(total));
    (Arc::clone(&bar) as Arc<dyn ProgressReporter>, Some(bar))
}
