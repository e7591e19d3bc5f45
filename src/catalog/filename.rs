//! File name cleanup and subject-folder detection for catalog destinations.

use url::Url;

/// Maximum length (in characters) of a cleaned file or folder name.
const MAX_NAME_CHARS: usize = 200;

/// Subject folders checked in order; the first keyword hit wins, so more
/// specific names ("combined math") precede their general forms ("math").
const SUBJECT_FOLDERS: &[(&str, &[&str])] = &[
    ("Biology", &["biology"]),
    ("Physics", &["physics"]),
    ("Chemistry", &["chemistry"]),
    ("Combined Mathematics", &["combined math", "combined maths"]),
    ("Mathematics", &["mathematics", "math"]),
    ("ICT", &["ict", "information communication technology"]),
    ("English", &["english"]),
    ("Western Music", &["western music"]),
    ("Agriculture", &["agriculture"]),
    ("Tamil", &["tamil"]),
    ("Sinhala", &["sinhala"]),
    ("Health", &["health"]),
    ("Geography", &["geography"]),
    ("History", &["history"]),
    ("Science", &["science"]),
];

/// Folder used when no subject keyword matches.
pub const OTHER_SUBJECT: &str = "Other";

/// Makes a display name safe to use as a file or folder name.
///
/// Percent-encoded sequences are decoded first, then characters that are
/// invalid on common filesystems (`< > : " / \ | ? *` and control characters)
/// become `_`. Leading/trailing dots and spaces are trimmed and the result is
/// capped at 200 characters. An empty result becomes `unknown`.
#[must_use]
pub fn clean_filename(name: &str) -> String {
    let decoded = urlencoding::decode(name).map_or_else(|_| name.to_string(), |d| d.into_owned());
    let replaced: String = decoded
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        return "unknown".to_string();
    }
    trimmed.chars().take(MAX_NAME_CHARS).collect()
}

/// Derives a cleaned file name (with extension) from the last URL path segment.
#[must_use]
pub fn name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    Some(clean_filename(last))
}

/// Returns the subject folder for a display name, or [`OTHER_SUBJECT`].
#[must_use]
pub fn detect_subject(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    SUBJECT_FOLDERS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lower.contains(kw)))
        .map_or(OTHER_SUBJECT, |(folder, _)| folder)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_filename_replaces_invalid_chars() {
        assert_eq!(clean_filename("Unit 1: Cells/Tissues?"), "Unit 1_ Cells_Tissues_");
        assert_eq!(clean_filename("a<b>c|d*e\"f"), "a_b_c_d_e_f");
    }

    #[test]
    fn test_clean_filename_decodes_percent_escapes() {
        assert_eq!(clean_filename("Grade%2010%20Science"), "Grade 10 Science");
    }

    #[test]
    fn test_clean_filename_trims_dots_and_spaces() {
        assert_eq!(clean_filename("  .hidden name. "), "hidden name");
    }

    #[test]
    fn test_clean_filename_empty_becomes_unknown() {
        assert_eq!(clean_filename(""), "unknown");
        assert_eq!(clean_filename(" . . "), "unknown");
    }

    #[test]
    fn test_clean_filename_truncates_long_names() {
        let long = "x".repeat(500);
        assert_eq!(clean_filename(&long).chars().count(), 200);
    }

    #[test]
    fn test_name_from_url_uses_last_segment() {
        let url = Url::parse("https://nie.lk/pdf/tguide/Grade%2010%20ICT.pdf").unwrap();
        assert_eq!(name_from_url(&url).as_deref(), Some("Grade 10 ICT.pdf"));
        let bare = Url::parse("https://nie.lk/").unwrap();
        assert_eq!(name_from_url(&bare), None);
    }

    #[test]
    fn test_detect_subject_prefers_specific_keyword() {
        assert_eq!(detect_subject("Combined Maths Resource Book"), "Combined Mathematics");
        assert_eq!(detect_subject("Grade 12 Mathematics"), "Mathematics");
        assert_eq!(detect_subject("ICT Practical Guide"), "ICT");
        assert_eq!(detect_subject("Listening Test 3"), OTHER_SUBJECT);
    }
}
