//! Byte fixtures and catalog builders for integration tests.

use std::path::Path;

use eduvault_core::{CatalogEntry, FileKind};
use wiremock::MockServer;

/// PDF-looking bytes of exactly `size` whose strict prefixes classify as partial.
pub fn pdf_body(size: usize) -> Vec<u8> {
    const HEADER: &[u8] = b"%PDF-1.7\n";
    const TRAILER: &[u8] = b"%%EOF\n";
    let mut bytes = Vec::with_capacity(size);
    bytes.extend_from_slice(HEADER);
    let filler = size - HEADER.len() - TRAILER.len();
    bytes.extend((0..filler).map(|i| b'a' + (i % 26) as u8));
    bytes.extend_from_slice(TRAILER);
    bytes
}

/// Opaque audio-ish bytes of exactly `size`.
pub fn audio_body(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Entry served from `server` at `/<name>` and written to `dir/<name>`.
pub fn served_entry(server: &MockServer, dir: &Path, name: &str, kind: FileKind) -> CatalogEntry {
    CatalogEntry::new(name, format!("{}/{name}", server.uri()), dir.join(name), kind)
}

/// `Content-Range` value for serving `body[start..]`.
pub fn content_range(start: usize, body: &[u8]) -> String {
    format!("bytes {start}-{}/{}", body.len() - 1, body.len())
}
