//! Transfer unit: one HTTP fetch for one catalog entry.
//!
//! [`HttpClient::fetch`] looks at the bytes already on disk, decides between a
//! range resume and a fresh download, streams the body through a buffered
//! writer and re-classifies the result. It never returns `Err`; every failure
//! is folded into the returned [`TransferAttempt`].

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, HeaderMap, RANGE, REFERER};
use reqwest::{Client, StatusCode};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, FLUSH_INTERVAL_BYTES, READ_TIMEOUT_SECS};
use super::error::TransferError;
use crate::catalog::CatalogEntry;
use crate::progress::ProgressReporter;
use crate::shutdown::ShutdownSignal;
use crate::user_agent;
use crate::validate::{self, FileState, staging_path};

/// How a transfer attempt ended.
#[derive(Debug)]
pub enum TransferOutcome {
    /// The file was fetched from the start and validates.
    Completed,
    /// The file was completed by appending to a partial prefix and validates.
    RangeResumed,
    /// The attempt failed; bytes already on disk are kept unless they were unusable.
    Failed(TransferError),
}

impl TransferOutcome {
    /// Returns true for `Completed` and `RangeResumed`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&TransferError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Record of one attempt at one entry.
#[derive(Debug)]
pub struct TransferAttempt {
    /// The entry this attempt was for.
    pub entry: CatalogEntry,
    /// 1-based attempt number within the retry loop.
    pub attempt_number: u32,
    /// Resumable bytes on disk when the attempt started.
    pub bytes_already_present: u64,
    /// Bytes streamed to disk during this attempt.
    pub bytes_written: u64,
    /// Result of the attempt.
    pub outcome: TransferOutcome,
}

impl TransferAttempt {
    /// Creates an attempt record with the given outcome and no byte counts.
    #[must_use]
    pub fn new(entry: CatalogEntry, attempt_number: u32, outcome: TransferOutcome) -> Self {
        Self {
            entry,
            attempt_number,
            bytes_already_present: 0,
            bytes_written: 0,
            outcome,
        }
    }
}

/// Settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Maximum idle time while reading the response.
    pub read_timeout: Duration,
    /// User-Agent header value.
    pub user_agent: String,
    /// Optional Referer header sent with every request.
    pub referer: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
            user_agent: user_agent::default_download_user_agent(),
            referer: None,
        }
    }
}

/// HTTP client performing resumable transfers.
///
/// Create once and reuse for every entry so connections are pooled.
///
/// # Example
///
/// ```no_run
/// use eduvault_core::catalog::CatalogEntry;
/// use eduvault_core::download::HttpClient;
/// use eduvault_core::progress::NoProgress;
/// use eduvault_core::shutdown::ShutdownSignal;
/// use eduvault_core::validate::FileKind;
///
/// # async fn example() {
/// let client = HttpClient::new();
/// let entry = CatalogEntry::new("Science", "https://example.com/science.pdf", "books/science.pdf", FileKind::Pdf);
/// let attempt = client.fetch(&entry, 1, &ShutdownSignal::new(), &NoProgress).await;
/// println!("{:?}", attempt.outcome);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    referer: Option<String>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with default timeouts and User-Agent.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error (for example an unusable TLS backend).
    pub fn with_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .gzip(true)
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            referer: config.referer.clone(),
        })
    }

    /// Performs one transfer attempt for `entry`.
    ///
    /// - `partial` on disk: resume with `Range: bytes=<len>-`
    /// - `corrupt` on disk: discard and fetch from zero
    /// - `absent`: fetch from zero
    /// - `valid`: nothing to do, reported as `Completed`
    #[instrument(skip(self, entry, shutdown, progress), fields(url = %entry.source_url, attempt = attempt_number))]
    pub async fn fetch(
        &self,
        entry: &CatalogEntry,
        attempt_number: u32,
        shutdown: &ShutdownSignal,
        progress: &dyn ProgressReporter,
    ) -> TransferAttempt {
        let mut attempt = TransferAttempt::new(entry.clone(), attempt_number, TransferOutcome::Completed);
        let target = validate::write_target(&entry.destination, entry.kind);

        let result = self.transfer(entry, &target, &mut attempt, shutdown, progress).await;
        attempt.outcome = match result {
            Ok(true) => TransferOutcome::RangeResumed,
            Ok(false) => TransferOutcome::Completed,
            Err(error) => {
                remove_if_empty(&target).await;
                if target != entry.destination {
                    remove_if_empty(&entry.destination).await;
                }
                TransferOutcome::Failed(error)
            }
        };
        attempt
    }

    /// Returns `Ok(true)` when the file was completed through a range resume.
    async fn transfer(
        &self,
        entry: &CatalogEntry,
        target: &Path,
        attempt: &mut TransferAttempt,
        shutdown: &ShutdownSignal,
        progress: &dyn ProgressReporter,
    ) -> Result<bool, TransferError> {
        let url = entry.source_url.as_str();
        let parsed = Url::parse(url).map_err(|_| TransferError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransferError::invalid_url(url));
        }

        let offset = match validate::classify(&entry.destination, entry.kind) {
            FileState::Valid => {
                debug!(path = %entry.destination.display(), "already valid; nothing to fetch");
                return Ok(false);
            }
            FileState::Partial => tokio::fs::metadata(target).await.map_or(0, |meta| meta.len()),
            FileState::Corrupt => {
                info!(path = %entry.destination.display(), "discarding corrupt file");
                discard(entry).await?;
                0
            }
            FileState::Absent => 0,
        };
        attempt.bytes_already_present = offset;

        if let Some(parent) = entry.destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::filesystem(parent, e))?;
        }

        let mut response = self.send_unless_interrupted(url, (offset > 0).then_some(offset), shutdown).await?;
        if offset > 0 && response.status() == StatusCode::RANGE_NOT_SATISFIABLE {
            info!(offset, "range not satisfiable; refetching from the start");
            response = self.send_unless_interrupted(url, None, shutdown).await?;
        }

        let status = response.status();
        let append = if status == StatusCode::PARTIAL_CONTENT {
            let start = content_range_start(response.headers()).unwrap_or(offset);
            if start != offset {
                warn!(expected = offset, actual = start, "server resumed at the wrong offset");
                discard(entry).await?;
                return Err(TransferError::range_mismatch(url, offset, start));
            }
            offset > 0
        } else if status.is_success() {
            if let Some(content_type) = html_content_type(response.headers()) {
                return Err(TransferError::unexpected_content_type(url, content_type));
            }
            if offset > 0 {
                info!(offset, status = status.as_u16(), "server ignored range request; restarting from zero");
            }
            false
        } else {
            return Err(TransferError::http_status(url, status.as_u16()));
        };

        let base = if append { offset } else { 0 };
        let total = content_length(response.headers()).map(|len| base.saturating_add(len));
        let file = if append {
            OpenOptions::new().append(true).open(target).await
        } else {
            File::create(target).await
        }
        .map_err(|e| TransferError::filesystem(target, e))?;

        let mut writer = BufWriter::new(file);
        let sink = Sink {
            entry,
            path: target,
            base,
            total,
        };
        stream_to_file(&mut writer, response, &sink, shutdown, progress, &mut attempt.bytes_written).await?;

        let final_size = base.saturating_add(attempt.bytes_written);
        if entry.kind.rules().staged {
            if total.is_some_and(|expected| final_size < expected) {
                warn!(size = final_size, expected = ?total, "stream ended early; keeping staged bytes");
                return Err(TransferError::validation(target, FileState::Partial));
            }
            tokio::fs::rename(target, &entry.destination)
                .await
                .map_err(|e| TransferError::filesystem(&entry.destination, e))?;
        }

        match validate::classify(&entry.destination, entry.kind) {
            FileState::Valid => {
                info!(
                    path = %entry.destination.display(),
                    bytes = final_size,
                    resumed = append,
                    "download complete"
                );
                Ok(append)
            }
            state => Err(TransferError::validation(&entry.destination, state)),
        }
    }

    /// Races the request against `shutdown` so a slow server cannot hold an interrupt.
    async fn send_unless_interrupted(
        &self,
        url: &str,
        range_from: Option<u64>,
        shutdown: &ShutdownSignal,
    ) -> Result<reqwest::Response, TransferError> {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                info!("interrupted while waiting for response headers");
                Err(TransferError::interrupted(url))
            }
            response = self.send(url, range_from) => response,
        }
    }

    async fn send(&self, url: &str, range_from: Option<u64>) -> Result<reqwest::Response, TransferError> {
        let mut request = self.client.get(url);
        if let Some(referer) = &self.referer {
            request = request.header(REFERER, referer);
        }
        if let Some(offset) = range_from {
            // Offsets count decoded bytes, so the continuation must not be re-encoded.
            request = request
                .header(RANGE, format!("bytes={offset}-"))
                .header(ACCEPT_ENCODING, "identity");
        }
        let response = request.send().await.map_err(|e| TransferError::network(url, e))?;
        debug!(status = response.status().as_u16(), range_from = ?range_from, "response received");
        Ok(response)
    }
}

/// Where streamed bytes go and how progress is reported.
struct Sink<'a> {
    entry: &'a CatalogEntry,
    path: &'a Path,
    base: u64,
    total: Option<u64>,
}

/// Streams the response body into `writer`, counting bytes into `written`.
///
/// The writer is flushed every [`FLUSH_INTERVAL_BYTES`], on every error path
/// and on interrupt, then synced at the end of the stream.
async fn stream_to_file(
    writer: &mut BufWriter<File>,
    response: reqwest::Response,
    sink: &Sink<'_>,
    shutdown: &ShutdownSignal,
    progress: &dyn ProgressReporter,
    written: &mut u64,
) -> Result<(), TransferError> {
    let url = sink.entry.source_url.as_str();
    let mut stream = response.bytes_stream();
    let mut unflushed: usize = 0;

    loop {
        let next = tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                flush_quietly(writer, sink.path).await;
                info!(bytes = sink.base + *written, "interrupted; partial bytes kept");
                return Err(TransferError::interrupted(url));
            }
            next = stream.next() => next,
        };
        let Some(chunk) = next else { break };
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                flush_quietly(writer, sink.path).await;
                return Err(TransferError::network(url, error));
            }
        };

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| TransferError::filesystem(sink.path, e))?;
        *written += chunk.len() as u64;
        unflushed += chunk.len();
        if unflushed >= FLUSH_INTERVAL_BYTES {
            writer
                .flush()
                .await
                .map_err(|e| TransferError::filesystem(sink.path, e))?;
            unflushed = 0;
        }
        progress.bytes(sink.entry, sink.base + *written, sink.total);
    }

    writer
        .flush()
        .await
        .map_err(|e| TransferError::filesystem(sink.path, e))?;
    writer
        .get_mut()
        .sync_data()
        .await
        .map_err(|e| TransferError::filesystem(sink.path, e))?;
    Ok(())
}

async fn flush_quietly(writer: &mut BufWriter<File>, path: &Path) {
    if let Err(error) = writer.flush().await {
        warn!(path = %path.display(), error = %error, "failed to flush partial bytes");
    }
}

/// Removes the destination and, for staged kinds, its staging file.
async fn discard(entry: &CatalogEntry) -> Result<(), TransferError> {
    let mut paths = vec![entry.destination.clone()];
    if entry.kind.rules().staged {
        paths.push(staging_path(&entry.destination));
    }
    for path in paths {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "removed local bytes"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => return Err(TransferError::filesystem(path, error)),
        }
    }
    Ok(())
}

async fn remove_if_empty(path: &Path) {
    if let Ok(meta) = tokio::fs::metadata(path).await
        && meta.is_file()
        && meta.len() == 0
    {
        debug!(path = %path.display(), "removing empty file left by failed attempt");
        if let Err(error) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %error, "failed to remove empty file");
        }
    }
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Parses the start offset of `Content-Range: bytes <start>-<end>/<total>`.
fn content_range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(CONTENT_RANGE)?.to_str().ok()?;
    let spec = value.trim().strip_prefix("bytes")?.trim_start();
    spec.split('-').next()?.trim().parse().ok()
}

/// Returns the `Content-Type` value when it announces an HTML page.
fn html_content_type(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    content_type
        .to_ascii_lowercase()
        .contains("text/html")
        .then(|| content_type.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::test_support::fixtures::pdf_body;
    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use crate::validate::FileKind;
    use reqwest::header::HeaderValue;
    use tempfile::TempDir;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pdf_entry(server: &MockServer, dir: &TempDir, name: &str) -> CatalogEntry {
        CatalogEntry::new(
            name,
            format!("{}/{name}", server.uri()),
            dir.path().join(name),
            FileKind::Pdf,
        )
    }

    async fn fetch(entry: &CatalogEntry) -> TransferAttempt {
        HttpClient::new()
            .fetch(entry, 1, &ShutdownSignal::new(), &NoProgress)
            .await
    }

    #[tokio::test]
    async fn test_fetch_fresh_pdf_completes() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(60 * 1024);
        Mock::given(method("GET"))
            .and(path("/book.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "book.pdf");
        let attempt = fetch(&entry).await;

        assert!(matches!(attempt.outcome, TransferOutcome::Completed), "{:?}", attempt.outcome);
        assert_eq!(attempt.bytes_written, body.len() as u64);
        assert_eq!(std::fs::read(&entry.destination).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_creates_missing_parent_directories() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/deep.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body(51 * 1024)))
            .mount(&server)
            .await;

        let entry = CatalogEntry::new(
            "deep",
            format!("{}/deep.pdf", server.uri()),
            dir.path().join("Grade 10/Science/deep.pdf"),
            FileKind::Pdf,
        );
        let attempt = fetch(&entry).await;
        assert!(attempt.outcome.is_success(), "{:?}", attempt.outcome);
        assert!(entry.destination.is_file());
    }

    #[tokio::test]
    async fn test_fetch_resumes_partial_with_range_request() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(80 * 1024);
        let cut = 30_000;
        Mock::given(method("GET"))
            .and(path("/resume.pdf"))
            .and(header("range", format!("bytes={cut}-").as_str()))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header(
                        "Content-Range",
                        format!("bytes {cut}-{}/{}", body.len() - 1, body.len()).as_str(),
                    )
                    .set_body_bytes(body[cut..].to_vec()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "resume.pdf");
        std::fs::write(&entry.destination, &body[..cut]).unwrap();

        let attempt = fetch(&entry).await;

        assert!(matches!(attempt.outcome, TransferOutcome::RangeResumed), "{:?}", attempt.outcome);
        assert_eq!(attempt.bytes_already_present, cut as u64);
        assert_eq!(attempt.bytes_written, (body.len() - cut) as u64);
        assert_eq!(std::fs::read(&entry.destination).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_restarts_when_server_ignores_range() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(70 * 1024);
        Mock::given(method("GET"))
            .and(path("/norange.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "norange.pdf");
        std::fs::write(&entry.destination, &body[..10_000]).unwrap();

        let attempt = fetch(&entry).await;

        assert!(matches!(attempt.outcome, TransferOutcome::Completed), "{:?}", attempt.outcome);
        assert_eq!(std::fs::read(&entry.destination).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_refetches_in_full_after_416() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(64 * 1024);
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .and(header_exists("range"))
            .respond_with(ResponseTemplate::new(416))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "gone.pdf");
        // Header present, trailer missing: partial, so a range request goes out first.
        std::fs::write(&entry.destination, &pdf_body(90 * 1024)[..70 * 1024]).unwrap();

        let attempt = fetch(&entry).await;

        assert!(matches!(attempt.outcome, TransferOutcome::Completed), "{:?}", attempt.outcome);
        assert_eq!(std::fs::read(&entry.destination).unwrap(), body);
    }

    #[tokio::test]
    async fn test_fetch_rejects_range_starting_at_wrong_offset() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(60 * 1024);
        Mock::given(method("GET"))
            .and(path("/shifted.pdf"))
            .respond_with(
                ResponseTemplate::new(206)
                    .insert_header("Content-Range", format!("bytes 0-{}/{}", body.len() - 1, body.len()).as_str())
                    .set_body_bytes(body.clone()),
            )
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "shifted.pdf");
        std::fs::write(&entry.destination, &body[..5000]).unwrap();

        let attempt = fetch(&entry).await;

        match attempt.outcome {
            TransferOutcome::Failed(TransferError::RangeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, 5000);
                assert_eq!(actual, 0);
            }
            other => panic!("expected RangeMismatch, got {other:?}"),
        }
        assert!(!entry.destination.exists(), "misaligned bytes must be discarded");
    }

    #[tokio::test]
    async fn test_fetch_http_error_preserves_partial_bytes() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/flaky.pdf"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "flaky.pdf");
        let prefix = &pdf_body(60 * 1024)[..20_000];
        std::fs::write(&entry.destination, prefix).unwrap();

        let attempt = fetch(&entry).await;

        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::HttpStatus { status: 503, .. })
        ));
        assert_eq!(std::fs::read(&entry.destination).unwrap(), prefix);
    }

    #[tokio::test]
    async fn test_fetch_rejects_html_page_before_writing() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/login.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "text/html; charset=utf-8")
                    .set_body_bytes(vec![b'<'; 120 * 1024]),
            )
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "login.pdf");
        let attempt = fetch(&entry).await;

        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::UnexpectedContentType { .. })
        ));
        assert!(!entry.destination.exists());
    }

    #[tokio::test]
    async fn test_fetch_small_pdf_fails_validation() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/tiny.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body(4096)))
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "tiny.pdf");
        let attempt = fetch(&entry).await;

        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::Validation {
                state: FileState::Corrupt,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_fetch_empty_body_leaves_no_empty_file() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/empty.pdf"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "empty.pdf");
        let attempt = fetch(&entry).await;

        assert!(!attempt.outcome.is_success(), "{:?}", attempt.outcome);
        assert!(!entry.destination.exists());
    }

    #[tokio::test]
    async fn test_fetch_discards_corrupt_file_before_fetching() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(55 * 1024);
        Mock::given(method("GET"))
            .and(path("/broken.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "broken.pdf");
        std::fs::write(&entry.destination, b"<html>Not Found</html>").unwrap();

        let attempt = fetch(&entry).await;

        assert!(matches!(attempt.outcome, TransferOutcome::Completed), "{:?}", attempt.outcome);
        assert_eq!(attempt.bytes_already_present, 0);
        assert_eq!(std::fs::read(&entry.destination).unwrap(), body);
        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().all(|r| !r.headers.contains_key("range")));
    }

    #[tokio::test]
    async fn test_fetch_audio_is_staged_then_renamed() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = vec![7u8; 8 * 1024];
        Mock::given(method("GET"))
            .and(path("/track.mp3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "audio/mpeg")
                    .set_body_bytes(body.clone()),
            )
            .mount(&server)
            .await;

        let entry = CatalogEntry::new(
            "track",
            format!("{}/track.mp3", server.uri()),
            dir.path().join("track.mp3"),
            FileKind::Audio,
        );
        let attempt = fetch(&entry).await;

        assert!(matches!(attempt.outcome, TransferOutcome::Completed), "{:?}", attempt.outcome);
        assert_eq!(std::fs::read(&entry.destination).unwrap(), body);
        assert!(!staging_path(&entry.destination).exists());
    }

    #[tokio::test]
    async fn test_fetch_interrupted_keeps_partial_and_reports_interrupt() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let body = pdf_body(60 * 1024);
        Mock::given(method("GET"))
            .and(path("/stop.pdf"))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(body[1000..].to_vec()))
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "stop.pdf");
        std::fs::write(&entry.destination, &body[..1000]).unwrap();
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let attempt = HttpClient::new().fetch(&entry, 1, &shutdown, &NoProgress).await;

        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::Interrupted { .. })
        ));
        assert_eq!(std::fs::read(&entry.destination).unwrap(), &body[..1000]);
    }

    #[tokio::test]
    async fn test_fetch_interrupt_while_waiting_for_headers_returns_promptly() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/slow.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(pdf_body(60 * 1024))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "slow.pdf");
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.trigger();
        });

        let started = std::time::Instant::now();
        let attempt = HttpClient::new().fetch(&entry, 1, &shutdown, &NoProgress).await;

        assert!(
            started.elapsed() < Duration::from_secs(2),
            "interrupt took {:?}",
            started.elapsed()
        );
        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::Interrupted { .. })
        ));
        assert!(!entry.destination.exists());
    }

    #[tokio::test]
    async fn test_fetch_interrupt_during_416_refetch_returns_promptly() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/stale.pdf"))
            .and(header_exists("range"))
            .respond_with(ResponseTemplate::new(416))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/stale.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(pdf_body(60 * 1024))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let entry = pdf_entry(&server, &dir, "stale.pdf");
        let prefix = pdf_body(90 * 1024)[..70 * 1024].to_vec();
        std::fs::write(&entry.destination, &prefix).unwrap();
        let shutdown = ShutdownSignal::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.trigger();
        });

        let started = std::time::Instant::now();
        let attempt = HttpClient::new().fetch(&entry, 1, &shutdown, &NoProgress).await;

        assert!(started.elapsed() < Duration::from_secs(2), "interrupt took {:?}", started.elapsed());
        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::Interrupted { .. })
        ));
        assert_eq!(std::fs::read(&entry.destination).unwrap(), prefix);
    }

    #[tokio::test]
    async fn test_fetch_sends_referer_when_configured() {
        let Some(server) = start_mock_server_or_skip().await else {
            return;
        };
        let dir = TempDir::new().unwrap();
        Mock::given(method("GET"))
            .and(path("/ref.pdf"))
            .and(header("referer", "https://www.edupub.gov.lk/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(pdf_body(50 * 1024)))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClient::with_config(&ClientConfig {
            referer: Some("https://www.edupub.gov.lk/".to_string()),
            ..ClientConfig::default()
        })
        .unwrap();
        let entry = pdf_entry(&server, &dir, "ref.pdf");
        let attempt = client.fetch(&entry, 1, &ShutdownSignal::new(), &NoProgress).await;
        assert!(attempt.outcome.is_success(), "{:?}", attempt.outcome);
    }

    #[test]
    fn test_fetch_invalid_url_fails_without_touching_disk() {
        let dir = TempDir::new().unwrap();
        let entry = CatalogEntry::new("bad", "not a url", dir.path().join("bad.pdf"), FileKind::Pdf);
        let attempt = tokio_test::block_on(fetch(&entry));
        assert!(matches!(
            attempt.outcome,
            TransferOutcome::Failed(TransferError::InvalidUrl { .. })
        ));
        assert!(!entry.destination.exists());
    }

    #[test]
    fn test_content_range_start_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("bytes 1024-2047/4096"));
        assert_eq!(content_range_start(&headers), Some(1024));
        headers.insert(CONTENT_RANGE, HeaderValue::from_static("bytes */4096"));
        assert_eq!(content_range_start(&headers), None);
        assert_eq!(content_range_start(&HeaderMap::new()), None);
    }

    #[test]
    fn test_html_content_type_detection() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("Text/HTML; charset=UTF-8"));
        assert!(html_content_type(&headers).is_some());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
        assert!(html_content_type(&headers).is_none());
    }
}
