//! Byte fixtures that classify predictably.

/// PDF-looking bytes of exactly `size`: `%PDF-` header, `%%EOF` trailer near the end.
///
/// Any strict prefix that drops the last few bytes has no trailer and
/// therefore classifies as partial.
#[must_use]
pub fn pdf_body(size: usize) -> Vec<u8> {
    const HEADER: &[u8] = b"%PDF-1.7\n";
    const TRAILER: &[u8] = b"%%EOF\n";
    assert!(size >= HEADER.len() + TRAILER.len(), "fixture too small");
    let mut bytes = Vec::with_capacity(size);
    bytes.extend_from_slice(HEADER);
    let filler = size - HEADER.len() - TRAILER.len();
    bytes.extend((0..filler).map(|i| b'a' + (i % 26) as u8));
    bytes.extend_from_slice(TRAILER);
    bytes
}
