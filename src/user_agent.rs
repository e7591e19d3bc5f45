//! User-Agent strings sent with every transfer request.

/// Project URL advertised in the User-Agent so site operators can reach us.
const PROJECT_UA_URL: &str = "https://github.com/fierce/eduvault";

/// Default User-Agent for transfer requests (identifies the tool).
#[must_use]
pub fn default_download_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("eduvault/{version} (educational-archive-tool; +{PROJECT_UA_URL})")
}

/// Browser-like User-Agent for hosts that reject unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_user_agent_carries_version_and_url() {
        let ua = default_download_user_agent();
        assert!(ua.contains(PROJECT_UA_URL), "UA must contain project URL: {ua}");
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("eduvault/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
        );
    }

    #[test]
    fn test_browser_user_agent_looks_like_a_browser() {
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0"));
    }
}
