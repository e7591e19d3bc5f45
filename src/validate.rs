//! File classification by size and byte signature.
//!
//! The validator looks at the bytes already sitting at a destination path and
//! reports whether they form a complete file, a resumable prefix, or something
//! that must be thrown away. It never modifies the filesystem; callers decide
//! what to do with the answer.
//!
//! # Per-kind rules
//!
//! | Kind  | Header  | Trailer (last 1 KiB) | Minimum size | Staged |
//! |-------|---------|----------------------|--------------|--------|
//! | PDF   | `%PDF-` | `%%EOF`              | 50 KiB       | no     |
//! | Audio | -       | -                    | 1 KiB        | yes    |
//!
//! Staged kinds are written to `<destination>.part` while in flight and only
//! renamed into place once the transfer finishes, because nothing in their
//! bytes distinguishes a truncated file from a complete one.
//!
//! # Example
//!
//! ```no_run
//! use eduvault_core::validate::{FileKind, FileState, classify};
//! use std::path::Path;
//!
//! let state = classify(Path::new("books/Science/Chapter 1.pdf"), FileKind::Pdf);
//! if state == FileState::Partial {
//!     println!("resumable");
//! }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Minimum size of a complete PDF (smaller files are error pages or placeholders).
pub const PDF_MIN_BYTES: u64 = 50 * 1024;

/// Minimum plausible size of a complete audio file.
pub const AUDIO_MIN_BYTES: u64 = 1024;

/// Suffix appended to the destination of staged kinds while a transfer is in flight.
pub const STAGING_SUFFIX: &str = ".part";

const PDF_HEADER: &[u8] = b"%PDF-";
const PDF_TRAILER: &[u8] = b"%%EOF";
const PDF_TRAILER_WINDOW: u64 = 1024;

const PDF_RULES: KindRules = KindRules {
    min_bytes: PDF_MIN_BYTES,
    header: Some(PDF_HEADER),
    trailer: Some(PDF_TRAILER),
    trailer_window: PDF_TRAILER_WINDOW,
    staged: false,
};

const AUDIO_RULES: KindRules = KindRules {
    min_bytes: AUDIO_MIN_BYTES,
    header: None,
    trailer: None,
    trailer_window: 0,
    staged: true,
};

/// Expected content kind of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// PDF document (textbooks, teachers' guides, resource books).
    Pdf,
    /// Audio recording (MP3/WAV listening material).
    Audio,
}

impl FileKind {
    /// Returns the validation rules for this kind.
    #[must_use]
    pub fn rules(self) -> &'static KindRules {
        match self {
            Self::Pdf => &PDF_RULES,
            Self::Audio => &AUDIO_RULES,
        }
    }

    /// Infers the kind from a file extension, if it is one we know.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "mp3" | "wav" | "m4a" | "ogg" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Short upper-case label used in summaries and the HTML index.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Audio => "AUDIO",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signature and size rules for one [`FileKind`].
#[derive(Debug)]
pub struct KindRules {
    /// Files below this size are never valid.
    pub min_bytes: u64,
    /// Magic bytes expected at offset 0.
    pub header: Option<&'static [u8]>,
    /// End-of-file marker expected within the last `trailer_window` bytes.
    pub trailer: Option<&'static [u8]>,
    /// How many trailing bytes are searched for `trailer`.
    pub trailer_window: u64,
    /// Whether in-flight bytes live in a `.part` staging file.
    pub staged: bool,
}

/// State of a destination path as derived from the bytes on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    /// Nothing on disk.
    Absent,
    /// Complete file.
    Valid,
    /// Resumable prefix of the final file.
    Partial,
    /// Wrong or too-small content; must be discarded before fetching again.
    Corrupt,
}

impl FileState {
    /// Returns the stable lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Valid => "valid",
            Self::Partial => "partial",
            Self::Corrupt => "corrupt",
        }
    }

    /// Returns true for [`FileState::Valid`].
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the staging path (`<path>.part`) used by staged kinds.
#[must_use]
pub fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_os_string();
    staged.push(STAGING_SUFFIX);
    PathBuf::from(staged)
}

/// Returns the path a transfer for `kind` writes into.
#[must_use]
pub fn write_target(path: &Path, kind: FileKind) -> PathBuf {
    if kind.rules().staged {
        staging_path(path)
    } else {
        path.to_path_buf()
    }
}

/// Returns the number of bytes currently held for `path`, counting the
/// staging file for staged kinds when the final file does not exist yet.
#[must_use]
pub fn local_size(path: &Path, kind: FileKind) -> Option<u64> {
    if let Ok(meta) = std::fs::metadata(path) {
        return Some(meta.len());
    }
    if kind.rules().staged {
        return std::fs::metadata(staging_path(path))
            .ok()
            .map(|meta| meta.len());
    }
    None
}

/// Classifies the file at `path` against the rules for `kind`.
///
/// Classification order:
/// 1. `Absent` when nothing exists (for staged kinds: neither the file nor its `.part`).
/// 2. `Partial` for a staged kind whose final file is missing but whose `.part` exists.
/// 3. `Corrupt` when the header does not match.
/// 4. `Partial` when the header matches but the trailer is missing, whatever the size.
/// 5. `Corrupt` when the file is below the kind's minimum size.
/// 6. `Valid` otherwise.
///
/// Read errors other than "not found" are logged and reported as `Absent`,
/// leaving the transfer step to surface the underlying filesystem problem.
#[must_use]
pub fn classify(path: &Path, kind: FileKind) -> FileState {
    let rules = kind.rules();
    let state = match inspect(path, rules) {
        Ok(Some(state)) => state,
        Ok(None) if rules.staged && staging_path(path).is_file() => FileState::Partial,
        Ok(None) => FileState::Absent,
        Err(error) => {
            warn!(path = %path.display(), error = %error, "could not read file for validation");
            FileState::Absent
        }
    };
    debug!(path = %path.display(), kind = %kind, state = %state, "classified file");
    state
}

fn inspect(path: &Path, rules: &KindRules) -> io::Result<Option<FileState>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(error),
    };
    let meta = file.metadata()?;
    if !meta.is_file() {
        return Ok(Some(FileState::Corrupt));
    }
    let size = meta.len();

    if let Some(header) = rules.header {
        if size < header.len() as u64 {
            return Ok(Some(FileState::Corrupt));
        }
        let mut leading = vec![0u8; header.len()];
        file.read_exact(&mut leading)?;
        if leading != header {
            return Ok(Some(FileState::Corrupt));
        }
    }

    if let Some(trailer) = rules.trailer {
        file.seek(SeekFrom::Start(size.saturating_sub(rules.trailer_window)))?;
        let mut tail = Vec::new();
        file.take(rules.trailer_window).read_to_end(&mut tail)?;
        if !contains(&tail, trailer) {
            return Ok(Some(FileState::Partial));
        }
    }

    if size < rules.min_bytes {
        return Ok(Some(FileState::Corrupt));
    }
    Ok(Some(FileState::Valid))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|window| window == needle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Builds PDF-looking bytes of exactly `size` bytes.
    fn pdf_bytes(size: usize, with_trailer: bool) -> Vec<u8> {
        let mut bytes = vec![b'x'; size];
        bytes[..PDF_HEADER.len()].copy_from_slice(PDF_HEADER);
        if with_trailer {
            let start = size - PDF_TRAILER.len() - 1;
            bytes[start..start + PDF_TRAILER.len()].copy_from_slice(PDF_TRAILER);
            bytes[size - 1] = b'\n';
        }
        bytes
    }

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn test_classify_missing_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let state = classify(&dir.path().join("nope.pdf"), FileKind::Pdf);
        assert_eq!(state, FileState::Absent);
    }

    #[test]
    fn test_classify_pdf_exactly_min_size_is_valid() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.pdf", &pdf_bytes(50 * 1024, true));
        assert_eq!(classify(&path, FileKind::Pdf), FileState::Valid);
    }

    #[test]
    fn test_classify_pdf_one_byte_below_min_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.pdf", &pdf_bytes(50 * 1024 - 1, true));
        assert_eq!(classify(&path, FileKind::Pdf), FileState::Corrupt);
    }

    #[test]
    fn test_classify_pdf_without_trailer_is_partial_regardless_of_size() {
        let dir = TempDir::new().unwrap();
        let small = write(&dir, "small.pdf", &pdf_bytes(2048, false));
        let large = write(&dir, "large.pdf", &pdf_bytes(200 * 1024, false));
        assert_eq!(classify(&small, FileKind::Pdf), FileState::Partial);
        assert_eq!(classify(&large, FileKind::Pdf), FileState::Partial);
    }

    #[test]
    fn test_classify_pdf_wrong_header_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let mut bytes = pdf_bytes(80 * 1024, true);
        bytes[..5].copy_from_slice(b"<html");
        let path = write(&dir, "error.pdf", &bytes);
        assert_eq!(classify(&path, FileKind::Pdf), FileState::Corrupt);
    }

    #[test]
    fn test_classify_empty_pdf_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.pdf", b"");
        assert_eq!(classify(&path, FileKind::Pdf), FileState::Corrupt);
    }

    #[test]
    fn test_classify_pdf_trailer_outside_window_is_partial() {
        let dir = TempDir::new().unwrap();
        let mut bytes = pdf_bytes(100 * 1024, false);
        // Marker present, but more than 1 KiB before the end.
        let at = 100 * 1024 - 4096;
        bytes[at..at + PDF_TRAILER.len()].copy_from_slice(PDF_TRAILER);
        let path = write(&dir, "late.pdf", &bytes);
        assert_eq!(classify(&path, FileKind::Pdf), FileState::Partial);
    }

    #[test]
    fn test_classify_audio_by_size() {
        let dir = TempDir::new().unwrap();
        let ok = write(&dir, "track.mp3", &vec![0u8; 4096]);
        let tiny = write(&dir, "tiny.mp3", &[0u8; 100]);
        assert_eq!(classify(&ok, FileKind::Audio), FileState::Valid);
        assert_eq!(classify(&tiny, FileKind::Audio), FileState::Corrupt);
    }

    #[test]
    fn test_classify_audio_staging_file_is_partial() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("track.wav");
        std::fs::write(staging_path(&dest), vec![0u8; 10_000]).unwrap();
        assert_eq!(classify(&dest, FileKind::Audio), FileState::Partial);
        assert_eq!(local_size(&dest, FileKind::Audio), Some(10_000));
    }

    #[test]
    fn test_classify_directory_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("folder.pdf");
        std::fs::create_dir(&path).unwrap();
        assert_eq!(classify(&path, FileKind::Pdf), FileState::Corrupt);
    }

    #[test]
    fn test_staging_path_appends_suffix() {
        let path = staging_path(Path::new("out/Listening 1.mp3"));
        assert_eq!(path, PathBuf::from("out/Listening 1.mp3.part"));
        assert_eq!(
            write_target(Path::new("a.pdf"), FileKind::Pdf),
            PathBuf::from("a.pdf")
        );
    }

    #[test]
    fn test_file_kind_from_path() {
        assert_eq!(FileKind::from_path(Path::new("x/Book.PDF")), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_path(Path::new("a.mp3")), Some(FileKind::Audio));
        assert_eq!(FileKind::from_path(Path::new("a.wav")), Some(FileKind::Audio));
        assert_eq!(FileKind::from_path(Path::new("a.html")), None);
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }
}
