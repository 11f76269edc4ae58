//! Runtime configuration and behavior constants.
//!
//! Server settings come from the environment; the page behaviors are tuned
//! by the constants below.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Page Behavior
// ============================================================================

/// Selector for the article body every behavior is scoped to.
pub const CONTENT_SELECTOR: &str = ".post-content";

/// Minimum trimmed text length for a paragraph to get an id or a control.
pub const MIN_PARAGRAPH_LENGTH: usize = 50;

/// Maximum characters of paragraph text carried in comment metadata.
pub const MAX_CITATION_LENGTH: usize = 200;

/// Below this viewport width the comment dialog becomes a bottom sheet.
pub const MOBILE_BREAKPOINT: f64 = 768.0;

pub const POPOVER_WIDTH: f64 = 380.0;
pub const POPOVER_SPACING: f64 = 20.0;

// ============================================================================
// Timings
// ============================================================================

pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_millis(2000);
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);
pub const DIALOG_OPEN_DELAY: Duration = Duration::from_millis(10);
pub const BACKDROP_EXIT_DELAY: Duration = Duration::from_millis(300);
pub const DEEP_LINK_OPEN_DELAY: Duration = Duration::from_millis(500);
pub const SUCCESS_MESSAGE_DURATION: Duration = Duration::from_millis(3000);
pub const CLOSE_AFTER_POST_DELAY: Duration = Duration::from_millis(1500);
pub const ERROR_BANNER_DURATION: Duration = Duration::from_millis(5000);
pub const WIDGET_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const WIDGET_READY_TIMEOUT: Duration = Duration::from_secs(10);
pub const SIMULATED_POST_LATENCY: Duration = Duration::from_millis(1000);

// ============================================================================
// Server Configuration
// ============================================================================

pub const DEFAULT_CONTENT_DIR: &str = "content";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SITE_ORIGIN: &str = "http://127.0.0.1:3000";

/// Giscus embed settings. The widget script is only rendered when a
/// repository is configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiscusConfig {
    pub repo: String,
    pub repo_id: String,
    pub category: String,
    pub category_id: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub content_dir: PathBuf,
    pub bind_addr: String,
    pub site_origin: String,
    pub min_paragraph_length: usize,
    pub giscus: Option<GiscusConfig>,
}

impl Config {
    /// Read configuration from `MARGINALIA_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let min_paragraph_length = non_empty("MARGINALIA_MIN_PARAGRAPH")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(MIN_PARAGRAPH_LENGTH);

        let giscus = non_empty("MARGINALIA_GISCUS_REPO").map(|repo| GiscusConfig {
            repo,
            repo_id: non_empty("MARGINALIA_GISCUS_REPO_ID").unwrap_or_default(),
            category: non_empty("MARGINALIA_GISCUS_CATEGORY")
                .unwrap_or_else(|| "Comments".to_string()),
            category_id: non_empty("MARGINALIA_GISCUS_CATEGORY_ID").unwrap_or_default(),
        });

        Self {
            content_dir: PathBuf::from(
                non_empty("MARGINALIA_CONTENT_DIR").unwrap_or_else(|| DEFAULT_CONTENT_DIR.into()),
            ),
            bind_addr: non_empty("MARGINALIA_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            site_origin: non_empty("MARGINALIA_ORIGIN")
                .map(|o| o.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SITE_ORIGIN.into()),
            min_paragraph_length,
            giscus,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_environment() {
        let config = Config::default();
        assert_eq!(config.content_dir, PathBuf::from("content"));
        assert_eq!(config.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.min_paragraph_length, 50);
        assert!(config.giscus.is_none());
    }

    #[test]
    fn test_lookup_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("MARGINALIA_CONTENT_DIR", "posts"),
            ("MARGINALIA_ORIGIN", "https://blog.example.com/"),
            ("MARGINALIA_MIN_PARAGRAPH", "80"),
            ("MARGINALIA_GISCUS_REPO", "someone/blog"),
        ]);
        let config = Config::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.content_dir, PathBuf::from("posts"));
        assert_eq!(config.site_origin, "https://blog.example.com");
        assert_eq!(config.min_paragraph_length, 80);
        let giscus = config.giscus.expect("giscus configured");
        assert_eq!(giscus.repo, "someone/blog");
        assert_eq!(giscus.category, "Comments");
    }

    #[test]
    fn test_unparseable_min_length_falls_back() {
        let config = Config::from_lookup(|k| {
            (k == "MARGINALIA_MIN_PARAGRAPH").then(|| "lots".to_string())
        });
        assert_eq!(config.min_paragraph_length, MIN_PARAGRAPH_LENGTH);
    }
}
