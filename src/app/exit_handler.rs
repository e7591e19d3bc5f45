//! Exit code logic for the eduvault process.
//!
//! Single responsibility: map a finished run report to the process exit outcome.

use eduvault_core::RunReport;

use crate::ProcessExit;

/// Determines the process exit outcome from a run report.
///
/// An interrupted run always fails so scripts re-run it. Otherwise a run with
/// failures is partial when at least one entry ended valid (fetched, repaired
/// or already present).
pub(crate) fn determine_exit_outcome(report: &RunReport) -> ProcessExit {
    if report.interrupted {
        ProcessExit::Failure
    } else if report.failed.is_empty() {
        ProcessExit::Success
    } else if report.succeeded() + report.skipped > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::determine_exit_outcome;
    use crate::ProcessExit;
    use eduvault_core::{CatalogEntry, FailedEntry, FileKind, RunReport};

    fn failed(n: usize) -> Vec<FailedEntry> {
        (0..n)
            .map(|i| FailedEntry {
                entry: CatalogEntry::new(
                    format!("book{i}"),
                    format!("https://example.com/{i}.pdf"),
                    format!("{i}.pdf"),
                    FileKind::Pdf,
                ),
                reason: "HTTP 404".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        let report = RunReport {
            downloaded: 3,
            ..RunReport::default()
        };
        assert_eq!(determine_exit_outcome(&report), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_success_when_nothing_processed() {
        assert_eq!(determine_exit_outcome(&RunReport::default()), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        let report = RunReport {
            repaired: 2,
            failed: failed(1),
            ..RunReport::default()
        };
        assert_eq!(determine_exit_outcome(&report), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_partial_when_skipped_and_failed() {
        let report = RunReport {
            skipped: 4,
            failed: failed(1),
            ..RunReport::default()
        };
        assert_eq!(determine_exit_outcome(&report), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        let report = RunReport {
            failed: failed(2),
            ..RunReport::default()
        };
        assert_eq!(determine_exit_outcome(&report), ProcessExit::Failure);
    }

    #[test]
    fn test_exit_outcome_failure_when_interrupted() {
        let report = RunReport {
            downloaded: 5,
            interrupted: true,
            ..RunReport::default()
        };
        assert_eq!(determine_exit_outcome(&report), ProcessExit::Failure);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Partial.code(), 2);
    }
}
