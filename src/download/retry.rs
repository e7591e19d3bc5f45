//! Bounded retry loop with linear backoff around the transfer unit.
//!
//! # Overview
//!
//! [`RetryPolicy`] decides whether a failed attempt is retried and how long to
//! wait; [`RetryScheduler`] drives [`HttpClient::fetch`] under that policy.
//!
//! Delays grow linearly: before attempt *n* (n ≥ 2) the scheduler waits
//! `base_delay * (n - 1)`, so the defaults give 5 s, 10 s, 15 s, 20 s.
//!
//! Before every attempt after the first the destination is re-validated and
//! the loop short-circuits when the file is already valid.
//!
//! # Example
//!
//! ```
//! use eduvault_core::download::{RetryDecision, RetryPolicy, TransferError};
//!
//! let policy = RetryPolicy::default();
//! let error = TransferError::http_status("https://example.com/book.pdf", 503);
//!
//! match policy.should_retry(&error, 1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use super::client::{HttpClient, TransferAttempt, TransferOutcome};
use super::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY};
use super::error::TransferError;
use crate::catalog::CatalogEntry;
use crate::progress::ProgressReporter;
use crate::shutdown::ShutdownSignal;
use crate::validate;

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// Attempt budget and linear backoff.
///
/// # Default Values
///
/// - `max_attempts`: 5
/// - `base_delay`: 5 seconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Delay unit of the linear backoff.
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff unit.
    #[must_use]
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Delay to wait before `attempt` (1-based). Zero for the first attempt.
    #[must_use]
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_sub(1))
    }

    /// Determines whether to retry after `attempt` failed with `error`.
    #[instrument(level = "debug", skip(self, error), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, error: &TransferError, attempt: u32) -> RetryDecision {
        if error.aborts_entry() {
            return RetryDecision::DoNotRetry {
                reason: format!("not retryable: {error}"),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let next = attempt + 1;
        RetryDecision::Retry {
            delay: self.delay_before(next),
            attempt: next,
        }
    }
}

/// Runs the transfer unit for one entry until it succeeds or the policy gives up.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    client: HttpClient,
    policy: RetryPolicy,
    shutdown: ShutdownSignal,
}

impl RetryScheduler {
    /// Creates a scheduler.
    #[must_use]
    pub fn new(client: HttpClient, policy: RetryPolicy, shutdown: ShutdownSignal) -> Self {
        Self {
            client,
            policy,
            shutdown,
        }
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Returns the shutdown signal shared with the transfer unit.
    #[must_use]
    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Runs attempts for `entry` and returns the final one.
    ///
    /// Exhaustion is not an error: the last failed attempt is returned and the
    /// caller records it.
    #[instrument(skip(self, entry, progress), fields(entry = %entry.display_name))]
    pub async fn run(&self, entry: &CatalogEntry, progress: &dyn ProgressReporter) -> TransferAttempt {
        let mut attempt_number = 1;
        loop {
            let attempt = self
                .client
                .fetch(entry, attempt_number, &self.shutdown, progress)
                .await;
            let Some(failure) = attempt.outcome.error() else {
                return attempt;
            };

            let (delay, next) = match self.policy.should_retry(failure, attempt_number) {
                RetryDecision::Retry { delay, attempt } => (delay, attempt),
                RetryDecision::DoNotRetry { reason } => {
                    if !failure.is_interrupted() {
                        error!(
                            attempt = attempt_number,
                            bytes_on_disk = attempt.bytes_already_present + attempt.bytes_written,
                            error = %failure,
                            %reason,
                            "giving up on entry"
                        );
                    }
                    return attempt;
                }
            };

            warn!(
                attempt = attempt_number,
                bytes_on_disk = attempt.bytes_already_present + attempt.bytes_written,
                error = %failure,
                "attempt failed"
            );
            progress.retry_scheduled(entry, next, delay, failure);
            info!(next_attempt = next, delay_secs = delay.as_secs_f64(), "retrying download");

            if !self.shutdown.sleep(delay).await {
                return TransferAttempt::new(
                    entry.clone(),
                    attempt_number,
                    TransferOutcome::Failed(TransferError::interrupted(&entry.source_url)),
                );
            }

            attempt_number = next;
            if validate::classify(&entry.destination, entry.kind).is_valid() {
                info!(attempt = attempt_number, "file became valid before retry; skipping fetch");
                return TransferAttempt::new(entry.clone(), attempt_number, TransferOutcome::Completed);
            }
        }
    }
}
