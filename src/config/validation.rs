use crate::config::types::{CrawlConfig, CrawlSettings, FetchMode};
use crate::url::normalize_link;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use scraper::Selector;
use std::time::Duration;
use url::Url;

impl CrawlConfig {
    /// Validates settings against a seed URL and builds the configuration
    ///
    /// # Arguments
    ///
    /// * `seed` - The crawl origin; must be an absolute http(s) URL with a host
    /// * `settings` - Raw settings from a file, the CLI, or [`CrawlSettings::default`]
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlConfig)` - A configuration that every component can rely on
    /// * `Err(ConfigError)` - The seed or one of the settings is unusable
    ///
    /// # Example
    ///
    /// ```
    /// use page_harvest::config::{CrawlConfig, CrawlSettings};
    ///
    /// let config = CrawlConfig::new("https://example.com", CrawlSettings::default()).unwrap();
    /// assert_eq!(config.seed_host(), "example.com");
    /// ```
    pub fn new(seed: &str, settings: CrawlSettings) -> Result<Self, ConfigError> {
        let seed_url = validate_seed(seed)?;
        validate_limits(&settings)?;

        let request_delay = seconds("request_delay", settings.request_delay, true)?;
        let request_timeout = seconds("request_timeout", settings.request_timeout, false)?;
        let render_wait = seconds("render_wait", settings.render_wait, true)?;

        // The render wait runs inside each attempt's timeout
        if settings.fetch_mode == FetchMode::Rendered && render_wait >= request_timeout {
            return Err(ConfigError::Validation(format!(
                "render_wait ({}s) must be shorter than request_timeout ({}s) in rendered mode",
                settings.render_wait, settings.request_timeout
            )));
        }

        if !settings.backoff_factor.is_finite() || settings.backoff_factor < 0.0 {
            return Err(ConfigError::Validation(format!(
                "backoff_factor must be a non-negative number, got {}",
                settings.backoff_factor
            )));
        }

        validate_selectors(&settings.content_selectors)?;
        let ignored_extensions = validate_extensions(&settings.ignored_extensions)?;
        validate_headers(&settings)?;

        Ok(Self {
            seed_url,
            max_depth: settings.max_depth,
            max_pages: settings.max_pages,
            max_queue_size: settings.max_queue_size,
            request_delay,
            request_timeout,
            max_retries: settings.max_retries,
            backoff_factor: settings.backoff_factor,
            restrict_to_domain: settings.restrict_to_domain,
            strip_url_params: settings.strip_url_params,
            ignored_extensions,
            content_selectors: settings.content_selectors,
            traversal_order: settings.traversal_order,
            shuffle_seed: settings.shuffle_seed,
            fetch_mode: settings.fetch_mode,
            render_wait,
            politeness: settings.politeness,
            headers: settings.headers,
        })
    }
}

/// Validates the seed URL and returns it with its fragment removed
fn validate_seed(seed: &str) -> Result<Url, ConfigError> {
    let mut url = normalize_link(seed.trim(), false)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    // The seed keeps its query; only the fragment never reaches a server.
    url.set_fragment(None);
    Ok(url)
}

/// Validates the page and queue budgets
fn validate_limits(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            settings.max_pages
        )));
    }

    if settings.max_queue_size < 1 {
        return Err(ConfigError::Validation(format!(
            "max_queue_size must be >= 1, got {}",
            settings.max_queue_size
        )));
    }

    Ok(())
}

/// Converts a seconds value to a Duration, rejecting negative and non-finite input
fn seconds(name: &str, value: f64, allow_zero: bool) -> Result<Duration, ConfigError> {
    let in_range = if allow_zero { value >= 0.0 } else { value > 0.0 };
    if !value.is_finite() || !in_range {
        let bound = if allow_zero { ">= 0" } else { "> 0" };
        return Err(ConfigError::Validation(format!(
            "{} must be {} seconds, got {}",
            name, bound, value
        )));
    }
    Duration::try_from_secs_f64(value)
        .map_err(|e| ConfigError::Validation(format!("{} is out of range: {}", name, e)))
}

/// Validates that every content selector is a usable CSS selector
fn validate_selectors(selectors: &[String]) -> Result<(), ConfigError> {
    if selectors.is_empty() {
        return Err(ConfigError::Validation(
            "content_selectors cannot be empty".to_string(),
        ));
    }

    for selector in selectors {
        Selector::parse(selector)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))?;
    }

    Ok(())
}

/// Validates ignored extensions and returns them lower-cased
fn validate_extensions(extensions: &[String]) -> Result<Vec<String>, ConfigError> {
    extensions
        .iter()
        .map(|ext| {
            let ext = ext.trim();
            if ext.is_empty() {
                Err(ConfigError::Validation(
                    "ignored_extensions cannot contain empty entries".to_string(),
                ))
            } else {
                Ok(ext.to_lowercase())
            }
        })
        .collect()
}

/// Validates header names and values as HTTP tokens
fn validate_headers(settings: &CrawlSettings) -> Result<(), ConfigError> {
    for (name, value) in &settings.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }
    Ok(())
}
