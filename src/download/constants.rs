//! Constants for the download module (timeouts, flushing, pacing).

use std::time::Duration;

/// Default HTTP connect timeout (10 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default HTTP read timeout (5 minutes between bytes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Buffered bytes are flushed to the file at least this often.
pub const FLUSH_INTERVAL_BYTES: usize = 256 * 1024;

/// Default number of attempts per entry.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base delay of the linear retry backoff.
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(5);

/// Default pause between entries that touched the network.
pub const DEFAULT_INTER_ENTRY_DELAY: Duration = Duration::from_millis(1500);
