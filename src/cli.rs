//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Default inter-entry delay in seconds.
pub const DEFAULT_DELAY_SECS: f64 = 1.5;

/// Maximum accepted inter-entry delay in seconds.
pub const MAX_DELAY_SECS: f64 = 600.0;

/// Download, verify and repair a catalog of textbooks, guides and audio.
///
/// Files already valid on disk are skipped, partial files are resumed, and
/// `--check` re-validates an existing tree and repairs only what is broken.
#[derive(Parser, Debug, Clone)]
#[command(name = "eduvault")]
#[command(author, version, about)]
pub struct Args {
    /// Catalog file: JSON array of {name, url, destination, kind} or one URL per line
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Output root for relative and derived destinations [default: .]
    #[arg(short = 'o', long = "output", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seconds to wait between entries that hit the network
    #[arg(short = 'd', long, default_value_t = DEFAULT_DELAY_SECS, value_parser = parse_delay)]
    pub delay: f64,

    /// Only entries whose name contains one of these comma-separated words
    #[arg(short = 'b', long, value_name = "LIST")]
    pub books: Option<String>,

    /// Skip audio entries
    #[arg(short = 'p', long)]
    pub pdf_only: bool,

    /// Audit files on disk and repair only missing, partial or corrupt ones
    #[arg(short = 'c', long)]
    pub check: bool,

    /// Print the audit table and what would be fetched, without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Write an index.html listing every entry into the output root
    #[arg(long)]
    pub html: bool,

    /// Place derived destinations in subject folders (Biology, Physics, ...)
    #[arg(long)]
    pub by_subject: bool,

    /// Attempts per entry before it is reported as failed (1-10)
    #[arg(short = 'r', long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_attempts: u8,

    /// Base of the linear retry backoff in seconds (0-300)
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(0..=300))]
    pub retry_delay: u64,

    /// HTTP connect timeout in seconds (1-3600)
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: u64,

    /// HTTP read timeout in seconds (1-3600)
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: u64,

    /// Referer header sent with every request
    #[arg(long, value_name = "URL")]
    pub referer: Option<String>,

    /// Identify as a desktop browser instead of eduvault
    #[arg(long)]
    pub browser_ua: bool,

    /// Write the run report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Config file to use instead of $XDG_CONFIG_HOME/eduvault/config.toml
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

/// Parses a non-negative, finite delay in seconds.
pub fn parse_delay(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if !value.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&value) {
        return Err(format!("delay must be between 0 and {MAX_DELAY_SECS} seconds"));
    }
    Ok(value)
}
