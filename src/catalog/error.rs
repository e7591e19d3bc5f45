//! Error types for catalog resolution.
//!
//! Messages follow a What/Why/Fix shape so the CLI can print them unchanged.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while producing a catalog.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The catalog source could not be read.
    #[error("cannot read catalog {path}: {source}\n  Suggestion: check the path and permissions")]
    Read {
        /// Catalog file that failed to open or read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON manifest is malformed.
    #[error("invalid JSON catalog {path}: {source}\n  Suggestion: expected an array of {{\"name\", \"url\", \"destination\", \"kind\"}} objects")]
    Json {
        /// Manifest path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A catalog line or record is unusable.
    #[error("invalid catalog entry at {location}: {reason}")]
    InvalidEntry {
        /// Where the entry was found (`file:line` or `file[index]`).
        location: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// The resolver produced no entries at all.
    #[error("catalog {source_name} contains no downloadable entries\n  Suggestion: check the filter or the catalog contents")]
    Empty {
        /// Resolver or file name.
        source_name: String,
    },
}

impl ResolveError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a JSON parse error.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid-entry error.
    pub fn invalid_entry(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Creates an empty-catalog error.
    pub fn empty(source_name: impl Into<String>) -> Self {
        Self::Empty {
            source_name: source_name.into(),
        }
    }
}
