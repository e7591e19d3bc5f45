use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use eduvault_core::user_agent::{BROWSER_USER_AGENT, default_download_user_agent};
use eduvault_core::{
    AuditRow, Catalog, CatalogResolver, CatalogWalker, ClientConfig, EntryFilter, FileKind, HttpClient,
    ManifestResolver, RetryPolicy, RetryScheduler, RunReport, ShutdownSignal, audit, render_index, repair,
};
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{config_runtime, exit_handler, progress_manager, summary, terminal};
use crate::app_config::{self, VerbositySetting};
use crate::cli::Args;

pub(crate) async fn run_eduvault() -> Result<ProcessExit> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();
    let loaded = app_config::load_file_config(args.config.as_deref())?;
    let args = config_runtime::apply_config_defaults(args, &cli_sources, loaded.config.as_ref())?;

    let default_level = config_runtime::resolve_default_log_level(&args);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    terminal::init_tracing(default_level, force_cli_log_level, terminal::is_no_color_requested(&args));

    debug!(?args, "CLI arguments parsed");
    if let (Some(path), Some(config)) = (&loaded.path, &loaded.config) {
        debug!(
            path = %path.display(),
            verbosity = config.verbosity.map_or("unset", VerbositySetting::as_str),
            "Loaded config file"
        );
    }

    let output_root = args.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let resolver = ManifestResolver::new(&args.catalog, &output_root).by_subject(args.by_subject);
    let catalog = resolver
        .resolve()
        .await
        .with_context(|| format!("Failed to load catalog '{}'", args.catalog.display()))?;
    let filter = build_filter(&args);
    let selected = catalog.filtered(&filter).count();
    info!(
        resolver = resolver.name(),
        entries = catalog.len(),
        selected,
        output = %output_root.display(),
        "Catalog loaded"
    );

    if args.dry_run {
        run_dry_run(&catalog, &filter);
        return Ok(ProcessExit::Success);
    }

    tokio::fs::create_dir_all(&output_root)
        .await
        .with_context(|| format!("Failed to create output directory '{}'", output_root.display()))?;

    let client = HttpClient::with_config(&client_config(&args)).context("Failed to build HTTP client")?;
    let shutdown = ShutdownSignal::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.trigger();
        }
    });

    let policy = RetryPolicy::new(u32::from(args.max_attempts), Duration::from_secs(args.retry_delay));
    let use_bar = terminal::should_use_progress_bar(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let (reporter, bar) = progress_manager::build_progress(use_bar, selected);
    let walker = CatalogWalker::new(RetryScheduler::new(client, policy, shutdown))
        .with_delay(Duration::from_secs_f64(args.delay))
        .with_progress(reporter);

    let report = if args.check {
        info!("Auditing files on disk");
        let rows = audit(&catalog, &filter);
        print_audit_table(&rows);
        repair(&rows, &walker).await
    } else {
        walker.run_catalog(&catalog, &filter).await
    };

    if let Some(bar) = bar {
        bar.finish();
    }

    info!(
        downloaded = report.downloaded,
        resumed = report.resumed,
        skipped = report.skipped,
        repaired = report.repaired,
        failed = report.failed.len(),
        "Run complete"
    );
    for line in summary::render_run_summary(&report, summary::terminal_width()) {
        println!("{line}");
    }

    if args.html {
        write_index(&catalog, &output_root).await?;
    }
    if let Some(path) = &args.report {
        write_report(&report, path).await?;
    }

    if report.interrupted {
        warn!(succeeded = report.succeeded(), selected, "Interrupted. Run again to resume.");
    }

    Ok(exit_handler::determine_exit_outcome(&report))
}

fn build_filter(args: &Args) -> EntryFilter {
    let mut filter = match args.books.as_deref() {
        Some(list) => EntryFilter::from_name_list(list),
        None => EntryFilter::all(),
    };
    if args.pdf_only {
        filter = filter.with_kinds([FileKind::Pdf]);
    }
    filter
}

fn client_config(args: &Args) -> ClientConfig {
    let user_agent = if args.browser_ua {
        BROWSER_USER_AGENT.to_string()
    } else {
        default_download_user_agent()
    };
    ClientConfig {
        connect_timeout: Duration::from_secs(args.connect_timeout),
        read_timeout: Duration::from_secs(args.read_timeout),
        user_agent,
        referer: args.referer.clone(),
    }
}

fn run_dry_run(catalog: &Catalog, filter: &EntryFilter) {
    print_audit_table(&audit(catalog, filter));
    println!("Dry run - no files downloaded");
}

fn print_audit_table(rows: &[AuditRow]) {
    for line in summary::render_audit_table(rows, summary::terminal_width()) {
        println!("{line}");
    }
}

async fn write_index(catalog: &Catalog, output_root: &Path) -> Result<()> {
    let rows = audit(catalog, &EntryFilter::all());
    let html = render_index("eduvault catalog", output_root, &rows);
    let path = output_root.join("index.html");
    tokio::fs::write(&path, html)
        .await
        .with_context(|| format!("Failed to write index '{}'", path.display()))?;
    info!(path = %path.display(), "Wrote HTML index");
    Ok(())
}

async fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write report '{}'", path.display()))?;
    debug!(path = %path.display(), "Wrote run report");
    Ok(())
}
