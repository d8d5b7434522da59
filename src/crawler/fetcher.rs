//! Fetch gateway and the direct HTTP backend
//!
//! This module handles all page loading for the crawler, including:
//! - Building the HTTP client with the configured headers
//! - The [`PageSource`] trait both backends implement
//! - Per-attempt timeouts
//! - Retry with exponential backoff for transient failures
//! - The mandatory inter-request delay

use crate::config::CrawlConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// HTTP statuses treated as transient server-side failures
pub const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Reasons a page could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Render failed for {url}: {message}")]
    Render { url: String, message: String },

    #[error("URL disallowed by robots.txt: {url}")]
    Disallowed { url: String },
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 500/502/503/504 | Retry |
    /// | Timeout | Retry |
    /// | Connection failure | Retry |
    /// | Render navigation failure | Retry |
    /// | Any other status | Give up |
    /// | Body/decoding error | Give up |
    /// | Disallowed by robots.txt | Give up |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } | Self::Render { .. } => true,
            Self::Status { status, .. } => RETRY_STATUSES.contains(status),
            Self::Request { .. } | Self::Disallowed { .. } => false,
        }
    }

    /// Short category name used when summarizing failures
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "http status",
            Self::Connect { .. } => "connection",
            Self::Request { .. } => "request",
            Self::Render { .. } => "render",
            Self::Disallowed { .. } => "robots.txt",
        }
    }

    /// Classifies a reqwest error
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            Self::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Request {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Result of one gateway fetch, after retries and the trailing delay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page content was loaded
    Fetched {
        /// Raw HTML
        body: String,
        /// Number of attempts used
        attempts: u32,
    },

    /// The page could not be loaded
    Failed {
        error: FetchError,
        /// Number of attempts used
        attempts: u32,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// A backend that can load the HTML of a page
///
/// Implementations make exactly one attempt per call; retries, timeouts and
/// rate limiting belong to [`FetchGateway`].
#[async_trait]
pub trait PageSource: Send {
    /// Loads the document at `url`
    async fn load(&mut self, url: &str) -> Result<String, FetchError>;

    /// Releases long-lived resources; called once when the crawl ends
    async fn release(&mut self) {}

    /// Backend name for logs
    fn name(&self) -> &'static str;
}

/// Builds the header map sent with every direct request
pub fn build_headers(config: &CrawlConfig) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        // Names and values were validated when the configuration was built
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }
    headers
}

/// Builds an HTTP client with the configured headers and timeout
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::{CrawlConfig, CrawlSettings};
/// use page_harvest::crawler::build_http_client;
///
/// let config = CrawlConfig::new("https://example.com", CrawlSettings::default()).unwrap();
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .default_headers(build_headers(config))
        .timeout(config.request_timeout)
        .connect_timeout(config.request_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Plain HTTP GET backend
pub struct DirectFetch {
    client: Client,
}

impl DirectFetch {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for DirectFetch {
    async fn load(&mut self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, &e))
    }

    fn name(&self) -> &'static str {
        "direct"
    }
}

/// Retry settings for transient failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Base backoff, in seconds
    pub backoff_factor: f64,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `backoff_factor * 2^(retry-1)`
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(16) as i32;
        let seconds = self.backoff_factor * 2f64.powi(exponent);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }
}

/// Wraps a [`PageSource`] with timeout, retry and rate limiting
///
/// Every call to [`FetchGateway::fetch`] ends with a sleep of
/// `request_delay`, whatever the outcome. This is the only rate limiting the
/// crawler performs.
pub struct FetchGateway {
    source: Box<dyn PageSource>,
    retry: RetryPolicy,
    timeout: Duration,
    delay: Duration,
}

impl FetchGateway {
    pub fn new(
        source: Box<dyn PageSource>,
        retry: RetryPolicy,
        timeout: Duration,
        delay: Duration,
    ) -> Self {
        Self {
            source,
            retry,
            timeout,
            delay,
        }
    }

    /// Creates a gateway over `source` using the configuration's policies
    pub fn from_config(source: Box<dyn PageSource>, config: &CrawlConfig) -> Self {
        Self::new(
            source,
            RetryPolicy {
                max_retries: config.max_retries,
                backoff_factor: config.backoff_factor,
            },
            config.request_timeout,
            config.request_delay,
        )
    }

    /// Fetches a page, never failing with a fault
    pub async fn fetch(&mut self, url: &str) -> FetchOutcome {
        tracing::info!("Fetching: {}", url);
        let outcome = self.fetch_with_retry(url).await;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        outcome
    }

    async fn fetch_with_retry(&mut self, url: &str) -> FetchOutcome {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let result = match tokio::time::timeout(self.timeout, self.source.load(url)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout {
                    url: url.to_string(),
                }),
            };

            match result {
                Ok(body) => {
                    return FetchOutcome::Fetched {
                        body,
                        attempts: attempt,
                    }
                }
                Err(error) if error.is_transient() && attempt <= self.retry.max_retries => {
                    let wait = self.retry.backoff(attempt);
                    tracing::warn!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        url,
                        error,
                        wait
                    );
                    if !wait.is_zero() {
                        tokio::time::sleep(wait).await;
                    }
                }
                Err(error) => {
                    tracing::error!("Error fetching {}: {}", url, error);
                    return FetchOutcome::Failed {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }
    }

    /// Releases the backend's resources
    pub async fn release(&mut self) {
        tracing::debug!("Releasing {} fetch backend", self.source.name());
        self.source.release().await;
    }

    pub fn backend_name(&self) -> &'static str {
        self.source.name()
    }
}
