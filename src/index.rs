//! Static HTML index listing catalog entries with their local status.

use std::fmt::Write as _;
use std::path::Path;

use crate::audit::AuditRow;
use crate::validate::FileState;

/// Renders a self-contained HTML page for `rows`.
///
/// Each row shows a kind badge, the escaped display name, the local state
/// and a link to the source URL. Valid files also link to the local copy,
/// relative to `root` when the destination lies under it.
#[must_use]
pub fn render_index(title: &str, root: &Path, rows: &[AuditRow]) -> String {
    let title = escape_html(title);
    let valid = rows.iter().filter(|row| row.state.is_valid()).count();

    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <h1>{title}</h1>\n<p class=\"meta\">{valid} of {total} files available locally</p>\n\
         <table>\n<thead><tr><th>Type</th><th>Name</th><th>Status</th><th>Links</th></tr></thead>\n<tbody>\n",
        total = rows.len(),
    );

    for row in rows {
        let entry = &row.entry;
        let label = entry.kind.label();
        let local_link = if row.state == FileState::Valid {
            let local = entry
                .destination
                .strip_prefix(root)
                .unwrap_or(&entry.destination);
            format!(
                " <a href=\"{}\">local</a>",
                escape_html(&href_path(local))
            )
        } else {
            String::new()
        };
        let _ = writeln!(
            html,
            "<tr><td><span class=\"badge {kind}\">{label}</span></td><td>{name}</td>\
             <td class=\"{state}\">{state}</td><td><a href=\"{url}\">download</a>{local_link}</td></tr>",
            kind = label.to_ascii_lowercase(),
            name = escape_html(&entry.display_name),
            state = row.state,
            url = escape_html(&entry.source_url),
        );
    }

    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    html
}

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:2rem;color:#222}\
table{border-collapse:collapse;width:100%}th,td{padding:.4rem .6rem;border-bottom:1px solid #ddd;text-align:left}\
.badge{font-size:.75rem;padding:.1rem .4rem;border-radius:.3rem;color:#fff}.pdf{background:#c0392b}\
.audio{background:#2c7be5}.valid{color:#1e7e34}.partial,.corrupt,.absent{color:#b00}.meta{color:#666}";

/// Escapes the five HTML-significant characters.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encodes each path component for use in an `href`.
fn href_path(path: &Path) -> String {
    path.components()
        .map(|component| urlencoding::encode(&component.as_os_str().to_string_lossy()).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
