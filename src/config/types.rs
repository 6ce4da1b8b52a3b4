use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for a scrape run
///
/// Built once at the boundary (CLI or library caller) and read-only for the
/// lifetime of the pipeline.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Seed URL of the documentation site
    pub base_url: String,

    /// Where the assembled markdown is written
    pub output_path: PathBuf,

    /// Minimum spacing between successive requests (seconds)
    pub delay_seconds: f64,

    /// Retries after the first attempt for retriable failures
    pub retries: u32,

    /// Per-request timeout (seconds)
    pub timeout_seconds: u64,

    /// Prepend a table of contents
    pub generate_toc: bool,

    /// Titles of TOC items to include (empty = all)
    pub toc_items: BTreeSet<String>,

    /// Enable debug output
    pub debug: bool,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Maximum number of pages fetched at once
    pub concurrency: usize,

    /// First retry backoff (seconds); doubles on every further retry
    pub backoff_base_seconds: f64,

    /// Upper bound for computed backoff (seconds)
    pub backoff_cap_seconds: f64,

    /// CSS selector overrides, tried before the built-in ones
    pub selectors: SelectorConfig,
}

impl ScrapeConfig {
    /// Creates a configuration with the default settings for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            output_path: PathBuf::from(super::DEFAULT_OUTPUT_PATH),
            delay_seconds: 0.5,
            retries: 3,
            timeout_seconds: 10,
            generate_toc: false,
            toc_items: BTreeSet::new(),
            debug: false,
            user_agent: super::user_agent_from_env(),
            concurrency: 4,
            backoff_base_seconds: 1.0,
            backoff_cap_seconds: 30.0,
            selectors: SelectorConfig::default(),
        }
    }

    pub fn delay(&self) -> Duration {
        seconds(self.delay_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn backoff_base(&self) -> Duration {
        seconds(self.backoff_base_seconds)
    }

    pub fn backoff_cap(&self) -> Duration {
        seconds(self.backoff_cap_seconds)
    }

    /// Returns true if a TOC-item filter is active
    pub fn has_toc_filter(&self) -> bool {
        !self.toc_items.is_empty()
    }
}

/// Converts a seconds setting, saturating instead of panicking on
/// out-of-range values (negative and NaN become zero)
fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

/// Custom CSS selectors, loaded from a TOML file
///
/// ```toml
/// nav = ["div.my-sidebar"]
/// content = ["div.doc-body"]
/// strip = ["div.feedback-widget"]
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorConfig {
    /// Navigation container selectors
    pub nav: Vec<String>,

    /// Main content container selectors
    pub content: Vec<String>,

    /// Extra elements to remove from content before conversion
    pub strip: Vec<String>,
}

impl SelectorConfig {
    pub fn is_empty(&self) -> bool {
        self.nav.is_empty() && self.content.is_empty() && self.strip.is_empty()
    }
}
