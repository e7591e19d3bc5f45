//! Built-in resolver reading a catalog from a local manifest file.
//!
//! Two formats are accepted:
//!
//! - **JSON** (`*.json`): an array of objects
//!   `{"name": "...", "url": "...", "destination": "...", "kind": "pdf" | "audio"}`
//!   where only `url` is required.
//! - **Plain text** (anything else): one entry per line, either `URL` or
//!   `URL<TAB>destination`. Blank lines and lines starting with `#` are skipped.
//!
//! Relative destinations are placed under the output root. When no
//! destination is given it is derived from the entry name or the last URL
//! segment, optionally inside a detected subject folder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use super::filename::{clean_filename, detect_subject, name_from_url};
use super::{Catalog, CatalogEntry, CatalogResolver, ResolveError, under_root};
use crate::validate::FileKind;

#[derive(Debug, Deserialize)]
struct ManifestRecord {
    #[serde(default)]
    name: Option<String>,
    url: String,
    #[serde(default)]
    destination: Option<PathBuf>,
    #[serde(default)]
    kind: Option<FileKind>,
}

/// Resolver backed by a JSON or plain-text catalog file.
#[derive(Debug, Clone)]
pub struct ManifestResolver {
    path: PathBuf,
    output_root: PathBuf,
    by_subject: bool,
}

impl ManifestResolver {
    /// Creates a resolver for `path`, placing relative destinations under `output_root`.
    pub fn new(path: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            output_root: output_root.into(),
            by_subject: false,
        }
    }

    /// Places derived destinations inside a subject folder (Biology/, Physics/, ...).
    #[must_use]
    pub fn by_subject(mut self, enabled: bool) -> Self {
        self.by_subject = enabled;
        self
    }

    /// Parses manifest text without touching the filesystem.
    ///
    /// `source_name` is used for error locations; `.json` selects the JSON format.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] for malformed JSON, invalid URLs, entries whose
    /// kind cannot be determined, or a manifest with no entries.
    pub fn parse(&self, source_name: &str, raw: &str) -> Result<Catalog, ResolveError> {
        let is_json = Path::new(source_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let entries = if is_json {
            self.parse_json(source_name, raw)?
        } else {
            self.parse_lines(source_name, raw)?
        };
        if entries.is_empty() {
            return Err(ResolveError::empty(source_name));
        }
        Ok(Catalog::from_entries(entries))
    }

    fn parse_json(&self, source_name: &str, raw: &str) -> Result<Vec<CatalogEntry>, ResolveError> {
        let records: Vec<ManifestRecord> =
            serde_json::from_str(raw).map_err(|e| ResolveError::json(source_name, e))?;
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                self.build_entry(
                    &format!("{source_name}[{index}]"),
                    &record.url,
                    record.name.as_deref(),
                    record.destination.as_deref(),
                    record.kind,
                )
            })
            .collect()
    }

    fn parse_lines(&self, source_name: &str, raw: &str) -> Result<Vec<CatalogEntry>, ResolveError> {
        let mut entries = Vec::new();
        for (line_index, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let location = format!("{source_name}:{}", line_index + 1);
            let (url, destination) = match line.split_once('\t') {
                Some((url, dest)) => (url.trim(), Some(Path::new(dest.trim()))),
                None => (line, None),
            };
            let destination = destination.filter(|d| !d.as_os_str().is_empty());
            entries.push(self.build_entry(&location, url, None, destination, None)?);
        }
        Ok(entries)
    }

    fn build_entry(
        &self,
        location: &str,
        raw_url: &str,
        name: Option<&str>,
        destination: Option<&Path>,
        kind: Option<FileKind>,
    ) -> Result<CatalogEntry, ResolveError> {
        let url = Url::parse(raw_url)
            .map_err(|e| ResolveError::invalid_entry(location, format!("invalid URL '{raw_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ResolveError::invalid_entry(
                location,
                format!("unsupported URL scheme '{}'", url.scheme()),
            ));
        }

        let url_name = name_from_url(&url);
        let destination = match destination {
            Some(dest) => under_root(&self.output_root, dest),
            None => {
                let file_name = derived_file_name(name, url_name.as_deref(), kind).ok_or_else(|| {
                    ResolveError::invalid_entry(location, "cannot derive a file name from the URL")
                })?;
                let display = name.unwrap_or(&file_name);
                if self.by_subject {
                    self.output_root.join(detect_subject(display)).join(&file_name)
                } else {
                    self.output_root.join(&file_name)
                }
            }
        };

        let kind = kind
            .or_else(|| FileKind::from_path(&destination))
            .or_else(|| url_name.as_deref().and_then(|n| FileKind::from_path(Path::new(n))))
            .ok_or_else(|| {
                ResolveError::invalid_entry(
                    location,
                    format!("cannot determine file kind of '{}'", destination.display()),
                )
            })?;

        let display_name = name.map_or_else(
            || {
                destination
                    .file_stem()
                    .map_or_else(|| "unknown".to_string(), |s| s.to_string_lossy().into_owned())
            },
            str::to_string,
        );

        debug!(%location, name = %display_name, destination = %destination.display(), "catalog entry");
        Ok(CatalogEntry::new(display_name, url.as_str(), destination, kind))
    }
}

/// File name for an entry with no explicit destination: the cleaned entry
/// name plus the URL's extension (or the kind's default), else the URL name.
fn derived_file_name(name: Option<&str>, url_name: Option<&str>, kind: Option<FileKind>) -> Option<String> {
    let Some(name) = name else {
        return url_name.map(str::to_string);
    };
    let ext = url_name
        .and_then(|n| Path::new(n).extension())
        .map(|e| e.to_string_lossy().to_lowercase())
        .or_else(|| {
            kind.map(|k| match k {
                FileKind::Pdf => "pdf".to_string(),
                FileKind::Audio => "mp3".to_string(),
            })
        });
    let stem = clean_filename(name);
    Some(match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    })
}

#[async_trait]
impl CatalogResolver for ManifestResolver {
    fn name(&self) -> &str {
        "manifest"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn resolve(&self) -> Result<Catalog, ResolveError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ResolveError::read(&self.path, e))?;
        let source_name = self.path.display().to_string();
        let catalog = self.parse(&source_name, &raw)?;
        info!(entries = catalog.len(), "catalog resolved");
        Ok(catalog)
    }
}
