use anyhow::{Result, bail};
use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) output_dir: bool,
    pub(crate) delay: bool,
    pub(crate) max_attempts: bool,
    pub(crate) retry_delay: bool,
    pub(crate) connect_timeout: bool,
    pub(crate) read_timeout: bool,
    pub(crate) referer: bool,
    pub(crate) browser_ua: bool,
    pub(crate) by_subject: bool,
    pub(crate) pdf_only: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    (args, sources_from_matches(&matches))
}

pub(crate) fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        output_dir: is_commandline_value(matches, "output_dir"),
        delay: is_commandline_value(matches, "delay"),
        max_attempts: is_commandline_value(matches, "max_attempts"),
        retry_delay: is_commandline_value(matches, "retry_delay"),
        connect_timeout: is_commandline_value(matches, "connect_timeout"),
        read_timeout: is_commandline_value(matches, "read_timeout"),
        referer: is_commandline_value(matches, "referer"),
        browser_ua: is_commandline_value(matches, "browser_ua"),
        by_subject: is_commandline_value(matches, "by_subject"),
        pdf_only: is_commandline_value(matches, "pdf_only"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills every value not given on the command line from the config file.
pub(crate) fn apply_config_defaults(
    mut args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> Result<Args> {
    if let Some(file_config) = file_config {
        if !cli_sources.output_dir
            && let Some(output_dir) = &file_config.output_dir
        {
            args.output_dir = Some(output_dir.clone());
        }

        if !cli_sources.delay
            && let Some(delay) = file_config.delay
        {
            args.delay = delay;
        }

        if !cli_sources.max_attempts
            && let Some(max_attempts) = file_config.max_attempts
        {
            args.max_attempts = max_attempts;
        }

        if !cli_sources.retry_delay
            && let Some(retry_delay) = file_config.retry_delay_secs
        {
            args.retry_delay = retry_delay;
        }

        if !cli_sources.connect_timeout
            && let Some(secs) = file_config.connect_timeout_secs
        {
            args.connect_timeout = secs;
        }

        if !cli_sources.read_timeout
            && let Some(secs) = file_config.read_timeout_secs
        {
            args.read_timeout = secs;
        }

        if !cli_sources.referer
            && let Some(referer) = &file_config.referer
        {
            args.referer = Some(referer.clone());
        }

        if !cli_sources.browser_ua
            && let Some(browser_ua) = file_config.browser_ua
        {
            args.browser_ua = browser_ua;
        }

        if !cli_sources.by_subject
            && let Some(by_subject) = file_config.by_subject
        {
            args.by_subject = by_subject;
        }

        if !cli_sources.pdf_only
            && let Some(pdf_only) = file_config.pdf_only
        {
            args.pdf_only = pdf_only;
        }

        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }
    }

    if !(1..=10).contains(&args.max_attempts) {
        bail!(
            "Invalid effective max_attempts value: {}. Expected range: 1..=10",
            args.max_attempts
        );
    }

    Ok(args)
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    let (quiet, verbose) = match verbosity {
        VerbositySetting::Default => (false, 0),
        VerbositySetting::Verbose => (false, 1),
        VerbositySetting::Quiet => (true, 0),
        VerbositySetting::Debug => (false, 2),
    };
    args.quiet = quiet;
    args.verbose = verbose;
}

pub(crate) fn resolve_default_log_level(args: &Args) -> &'static str {
    if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}
