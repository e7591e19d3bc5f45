//! Human-readable run summary and audit table printed to stdout.

use eduvault_core::{AuditRow, AuditSummary, RunReport};

pub(crate) fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|width| *width >= 20)
        .unwrap_or(80)
}

/// Truncates text to at most `width` chars, appending an ellipsis if truncated.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str("...");
    truncated
}

/// Renders the end-of-run summary.
pub(crate) fn render_run_summary(report: &RunReport, width: usize) -> Vec<String> {
    let mut lines = vec![
        "Summary:".to_string(),
        format!("  downloaded: {}", report.downloaded),
        format!("  resumed:    {}", report.resumed),
        format!("  skipped:    {}", report.skipped),
        format!("  repaired:   {}", report.repaired),
        format!("  failed:     {}", report.failed.len()),
    ];
    for failed in &report.failed {
        lines.push(truncate_to_width(
            &format!("  - {}: {}", failed.entry.display_name, failed.reason),
            width,
        ));
    }
    if report.interrupted {
        lines.push("Interrupted. Run again to resume.".to_string());
    }
    lines
}

/// Renders one line per audited entry followed by the state tallies.
pub(crate) fn render_audit_table(rows: &[AuditRow], width: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    for row in rows {
        let size = row
            .size
            .map_or_else(|| "-".to_string(), |bytes| indicatif::HumanBytes(bytes).to_string());
        lines.push(truncate_to_width(
            &format!(
                "{:<7} {:<5} {:>10}  {}",
                row.state.as_str(),
                row.entry.kind.label(),
                size,
                row.entry.display_name
            ),
            width,
        ));
    }
    let summary = AuditSummary::from_rows(rows);
    lines.push(format!(
        "{} valid, {} partial, {} corrupt, {} absent ({} to fetch)",
        summary.valid,
        summary.partial,
        summary.corrupt,
        summary.absent,
        summary.needs_repair()
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use eduvault_core::{CatalogEntry, FailedEntry, FileKind, FileState};

    #[test]
    fn test_terminal_width_returns_sensible_value() {
        let w = terminal_width();
        assert!(w >= 20, "terminal_width should be at least 20, got {w}");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_run_summary_lists_failures_and_interrupt() {
        let report = RunReport {
            downloaded: 2,
            resumed: 1,
            skipped: 3,
            failed: vec![FailedEntry {
                entry: CatalogEntry::new("Physics", "https://example.com/p.pdf", "p.pdf", FileKind::Pdf),
                reason: "HTTP 404".to_string(),
            }],
            interrupted: true,
            ..RunReport::default()
        };
        let lines = render_run_summary(&report, 80);
        assert!(lines.contains(&"  downloaded: 2".to_string()));
        assert!(lines.contains(&"  skipped:    3".to_string()));
        assert!(lines.contains(&"  - Physics: HTTP 404".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Interrupted. Run again to resume."));
    }

    #[test]
    fn test_audit_table_tallies_states() {
        let rows = vec![
            AuditRow {
                entry: CatalogEntry::new("Biology", "https://example.com/b.pdf", "b.pdf", FileKind::Pdf),
                state: FileState::Valid,
                size: Some(60 * 1024),
            },
            AuditRow {
                entry: CatalogEntry::new("Track 1", "https://example.com/t.mp3", "t.mp3", FileKind::Audio),
                state: FileState::Absent,
                size: None,
            },
        ];
        let lines = render_audit_table(&rows, 120);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("valid"));
        assert!(lines[0].ends_with("Biology"));
        assert!(lines[1].contains(" - "));
        assert_eq!(lines[2], "1 valid, 0 partial, 0 corrupt, 1 absent (1 to fetch)");
    }
}
