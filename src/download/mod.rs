//! Resumable HTTP transfers and the retry loop around them.
//!
//! # Features
//!
//! - Streaming downloads flushed to disk every 256 KiB
//! - Range resume of partial files, with misaligned continuations rejected
//! - Fresh refetch after `416` or when the server ignores `Range`
//! - HTML error pages rejected before any byte is written
//! - Configurable timeouts (10s connect, 5min read by default)
//! - Linear retry backoff with re-validation between attempts
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use eduvault_core::catalog::CatalogEntry;
//! use eduvault_core::download::{HttpClient, RetryPolicy, RetryScheduler};
//! use eduvault_core::progress::NoProgress;
//! use eduvault_core::shutdown::ShutdownSignal;
//! use eduvault_core::validate::FileKind;
//!
//! # async fn example() {
//! let scheduler = RetryScheduler::new(HttpClient::new(), RetryPolicy::default(), ShutdownSignal::new());
//! let entry = CatalogEntry::new("ICT", "https://example.com/ict.pdf", "ict.pdf", FileKind::Pdf);
//! let attempt = scheduler.run(&entry, &NoProgress).await;
//! println!("{} after {} attempt(s)", attempt.outcome.is_success(), attempt.attempt_number);
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod retry;

pub use client::{ClientConfig, HttpClient, TransferAttempt, TransferOutcome};
pub use error::TransferError;
pub use retry::{RetryDecision, RetryPolicy, RetryScheduler};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, TransferError>` explicitly in function signatures.
