//! Error types for the transfer unit.
//!
//! Each variant carries the URL or path it concerns so a single line in the
//! run summary is enough to diagnose the failure.

use std::path::PathBuf;

use thiserror::Error;

use crate::validate::FileState;

/// Reasons a single transfer attempt can fail.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network-level error (DNS resolution, connection refused, reset, TLS).
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timeout.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A 206 response started somewhere other than the requested offset.
    #[error("server resumed {url} at byte {actual} instead of {expected}; local bytes discarded")]
    RangeMismatch {
        /// The URL being resumed.
        url: String,
        /// Offset requested with `Range`.
        expected: u64,
        /// Start offset reported in `Content-Range`.
        actual: u64,
    },

    /// The response content type cannot be the expected file (an HTML error page for a PDF).
    #[error("unexpected content type '{content_type}' for {url}")]
    UnexpectedContentType {
        /// The URL being fetched.
        url: String,
        /// The `Content-Type` header value.
        content_type: String,
    },

    /// Cannot create, open, write or rename the destination.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The source URL is malformed or not HTTP(S).
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The transfer finished but the file on disk does not classify as valid.
    #[error("{path} is {state} after transfer")]
    Validation {
        /// Destination that failed post-transfer validation.
        path: PathBuf,
        /// Classification observed after the transfer.
        state: FileState,
    },

    /// Shutdown was requested while the entry was in progress.
    #[error("interrupted while downloading {url}")]
    Interrupted {
        /// The URL that was in flight.
        url: String,
    },
}

impl TransferError {
    /// Creates a network error, promoting reqwest timeouts to [`TransferError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a range-mismatch error.
    pub fn range_mismatch(url: impl Into<String>, expected: u64, actual: u64) -> Self {
        Self::RangeMismatch {
            url: url.into(),
            expected,
            actual,
        }
    }

    /// Creates an unexpected-content-type error.
    pub fn unexpected_content_type(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::UnexpectedContentType {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a post-transfer validation error.
    pub fn validation(path: impl Into<PathBuf>, state: FileState) -> Self {
        Self::Validation {
            path: path.into(),
            state,
        }
    }

    /// Creates an interruption error.
    pub fn interrupted(url: impl Into<String>) -> Self {
        Self::Interrupted { url: url.into() }
    }

    /// Returns true when retrying the entry cannot help and its attempt loop should end.
    ///
    /// | Variant | Aborts entry |
    /// |---------|--------------|
    /// | `Filesystem` | yes: no disk access, nothing to resume |
    /// | `InvalidUrl` | yes: the request can never be built |
    /// | `Interrupted` | yes: the run is stopping |
    /// | everything else | no: retried with backoff |
    #[must_use]
    pub fn aborts_entry(&self) -> bool {
        matches!(
            self,
            Self::Filesystem { .. } | Self::InvalidUrl { .. } | Self::Interrupted { .. }
        )
    }

    /// Returns true for [`TransferError::Interrupted`].
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}
