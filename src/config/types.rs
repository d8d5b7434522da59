use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// User agent sent when the configuration does not name one
pub const DEFAULT_USER_AGENT: &str = "Custom Web Crawler Bot 1.0 (https://example.com/bot)";

/// Order in which the URLs of one depth level are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TraversalOrder {
    /// Discovery order, breadth-first
    #[default]
    Ordered,
    /// Randomly permuted once per depth level
    Shuffled,
}

/// Which backend loads pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// Plain HTTP GET
    #[default]
    Direct,
    /// Headless browser with script execution
    Rendered,
}

/// How robots.txt rules are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolitenessPolicy {
    /// Rules are fetched and parsed but never consulted
    #[default]
    Permissive,
    /// Disallowed URLs are skipped
    Strict,
}

/// Raw crawler settings, as read from a TOML file or assembled by the CLI
///
/// Every field has a default, so an empty file is a valid settings file.
/// Durations are expressed in (fractional) seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlSettings {
    /// Maximum number of link-following generations from the seed
    pub max_depth: u32,

    /// Maximum number of URLs fetched over the whole crawl
    pub max_pages: usize,

    /// Maximum number of URLs kept for a single depth level
    pub max_queue_size: usize,

    /// Pause after every fetch, in seconds
    pub request_delay: f64,

    /// Deadline for a single fetch attempt, in seconds
    pub request_timeout: f64,

    /// Retries for transient failures
    pub max_retries: u32,

    /// Base of the exponential retry backoff, in seconds
    pub backoff_factor: f64,

    /// Only follow links whose hostname equals the seed's hostname
    pub restrict_to_domain: bool,

    /// Drop fragment and query string from discovered links
    pub strip_url_params: bool,

    /// Path suffixes that are never followed
    pub ignored_extensions: Vec<String>,

    /// CSS selectors tried in order to locate the main content
    pub content_selectors: Vec<String>,

    pub traversal_order: TraversalOrder,

    /// Fixed seed for shuffled traversal
    pub shuffle_seed: Option<u64>,

    pub fetch_mode: FetchMode,

    /// Grace period for script execution in rendered mode, in seconds
    pub render_wait: f64,

    pub politeness: PolitenessPolicy,

    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 100,
            max_queue_size: 1000,
            request_delay: 1.0,
            request_timeout: 10.0,
            max_retries: 3,
            backoff_factor: 0.3,
            restrict_to_domain: true,
            strip_url_params: true,
            ignored_extensions: [
                ".pdf", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".css", ".js", ".mp3", ".mp4",
                ".zip", ".tar.gz",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            content_selectors: ["main", "article", "#content", ".content", ".main-content"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            traversal_order: TraversalOrder::Ordered,
            shuffle_seed: None,
            fetch_mode: FetchMode::Direct,
            render_wait: 2.0,
            politeness: PolitenessPolicy::Permissive,
            headers: BTreeMap::from([(
                "User-Agent".to_string(),
                DEFAULT_USER_AGENT.to_string(),
            )]),
        }
    }
}

/// Validated, immutable crawl configuration
///
/// Built once through [`CrawlConfig::new`]; every crawler component borrows it.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_url: Url,
    pub max_depth: u32,
    pub max_pages: usize,
    pub max_queue_size: usize,
    pub request_delay: Duration,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub restrict_to_domain: bool,
    pub strip_url_params: bool,
    /// Lower-cased suffixes
    pub ignored_extensions: Vec<String>,
    pub content_selectors: Vec<String>,
    pub traversal_order: TraversalOrder,
    pub shuffle_seed: Option<u64>,
    pub fetch_mode: FetchMode,
    pub render_wait: Duration,
    pub politeness: PolitenessPolicy,
    pub headers: BTreeMap<String, String>,
}

impl CrawlConfig {
    /// Returns the User-Agent header value, matched case-insensitively
    pub fn user_agent(&self) -> &str {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .map(|(_, value)| value.as_str())
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Returns the seed URL's hostname (lowercase)
    pub fn seed_host(&self) -> &str {
        self.seed_url.host_str().unwrap_or_default()
    }
}
