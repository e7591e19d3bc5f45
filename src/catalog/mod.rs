//! Catalog of remote files a run should ensure exist locally.
//!
//! A catalog is an ordered list of [`CatalogEntry`] values, each naming one
//! remote source and one local destination. Catalogs come from a
//! [`CatalogResolver`]; site-specific scraping belongs in resolver
//! implementations and never in the download engine.
//!
//! # Architecture
//!
//! - [`CatalogEntry`] - immutable (name, URL, destination, kind) record
//! - [`Catalog`] - ordered entries, unique by destination path
//! - [`EntryFilter`] - selective-download predicate (name substrings, kinds)
//! - [`CatalogResolver`] - async trait producing a catalog
//! - [`ManifestResolver`] - built-in resolver reading a JSON or plain-text list

mod error;
mod filename;
mod manifest;

pub use error::ResolveError;
pub use filename::{OTHER_SUBJECT, clean_filename, detect_subject, name_from_url};
pub use manifest::ManifestResolver;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::validate::FileKind;

/// One remote file and where it belongs on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    /// Human-readable name shown in progress and summaries.
    pub display_name: String,
    /// Remote URL the bytes are fetched from.
    pub source_url: String,
    /// Local path the file is written to; unique within a catalog.
    pub destination: PathBuf,
    /// Expected content kind, selecting the validation rules.
    pub kind: FileKind,
}

impl CatalogEntry {
    /// Creates a new catalog entry.
    pub fn new(
        display_name: impl Into<String>,
        source_url: impl Into<String>,
        destination: impl Into<PathBuf>,
        kind: FileKind,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            source_url: source_url.into(),
            destination: destination.into(),
            kind,
        }
    }
}

/// Ordered catalog entries, unique by destination path.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog, keeping caller order and dropping later duplicates
    /// of an already-seen destination path.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut kept = Vec::new();
        for entry in entries {
            if seen.insert(entry.destination.clone()) {
                kept.push(entry);
            } else {
                warn!(
                    destination = %entry.destination.display(),
                    url = %entry.source_url,
                    "dropping duplicate catalog destination"
                );
            }
        }
        Self { entries: kept }
    }

    /// Returns the entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries accepted by `filter`, in catalog order.
    pub fn filtered<'a>(&'a self, filter: &'a EntryFilter) -> impl Iterator<Item = &'a CatalogEntry> {
        self.entries.iter().filter(move |entry| filter.matches(entry))
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Selective-download predicate applied before an entry is ever classified.
///
/// An empty filter accepts everything.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    names: Vec<String>,
    kinds: Option<Vec<FileKind>>,
}

impl EntryFilter {
    /// Filter accepting every entry.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Restricts to entries whose display name contains any of the given
    /// substrings (case-insensitive). Blank patterns are ignored.
    #[must_use]
    pub fn with_names<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Restricts to the given kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = FileKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Parses a comma-separated name filter such as `"Mathematics,Science"`.
    #[must_use]
    pub fn from_name_list(list: &str) -> Self {
        Self::all().with_names(list.split(','))
    }

    /// Returns true when `entry` passes every configured restriction.
    #[must_use]
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(kinds) = &self.kinds
            && !kinds.contains(&entry.kind)
        {
            return false;
        }
        if self.names.is_empty() {
            return true;
        }
        let name = entry.display_name.to_lowercase();
        self.names.iter().any(|pattern| name.contains(pattern))
    }

    /// Returns true when no restriction is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.kinds.is_none()
    }
}

/// Source of a catalog.
///
/// Implementations hold all site-specific knowledge (form posts, HTML
/// parsing, folder layout); the engine only consumes the resulting entries.
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produces the catalog for this run.
    async fn resolve(&self) -> Result<Catalog, ResolveError>;
}

/// Joins `destination` onto `root` unless it is already absolute.
#[must_use]
pub fn under_root(root: &Path, destination: &Path) -> PathBuf {
    if destination.is_absolute() {
        destination.to_path_buf()
    } else {
        root.join(destination)
    }
}
