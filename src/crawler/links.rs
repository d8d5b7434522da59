//! Link discovery and filtering
//!
//! Candidates pass through a fixed pipeline:
//! 1. Resolve the anchor against the page URL (optionally stripping fragment and query)
//! 2. Reject anything that does not resolve to a valid http(s) URL
//! 3. Reject other hosts when domain restriction is on
//! 4. Reject ignored file extensions
//! 5. Reject URLs the frontier already knows about
//!
//! The output is deduplicated with first-seen-wins ordering.

use crate::config::CrawlConfig;
use crate::crawler::frontier::Frontier;
use crate::url::{has_ignored_extension, resolve_link, same_host};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Why a candidate link was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRejection {
    Invalid,
    OffDomain,
    IgnoredExtension,
    AlreadyKnown,
}

impl fmt::Display for LinkRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Invalid => "invalid URL",
            Self::OffDomain => "outside seed host",
            Self::IgnoredExtension => "ignored extension",
            Self::AlreadyKnown => "already visited or queued",
        };
        f.write_str(reason)
    }
}

/// Extracts crawlable links from parsed pages
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    seed_host: String,
    restrict_to_domain: bool,
    strip_params: bool,
    ignored_extensions: Vec<String>,
}

impl LinkExtractor {
    pub fn new(
        seed_host: &str,
        restrict_to_domain: bool,
        strip_params: bool,
        ignored_extensions: Vec<String>,
    ) -> Self {
        Self {
            seed_host: seed_host.to_lowercase(),
            restrict_to_domain,
            strip_params,
            ignored_extensions,
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.seed_host(),
            config.restrict_to_domain,
            config.strip_url_params,
            config.ignored_extensions.clone(),
        )
    }

    /// Returns the links on `document` worth enqueueing, in document order
    ///
    /// # Arguments
    ///
    /// * `document` - The parsed page
    /// * `base_url` - The URL the page was fetched from
    /// * `frontier` - Used for the visited/pending membership check
    pub fn extract(&self, document: &Html, base_url: &Url, frontier: &Frontier) -> Vec<String> {
        let Ok(anchors) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        // Only anchors still attached to the tree count
        for element in document.root_element().select(&anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            match self.evaluate(href, base_url, frontier) {
                Ok(url) => {
                    if seen.insert(url.clone()) {
                        links.push(url);
                    }
                }
                Err(reason) => {
                    tracing::trace!("Skipping link {:?}: {}", href, reason);
                }
            }
        }

        links
    }

    /// Runs one href through the filter pipeline
    pub fn evaluate(
        &self,
        href: &str,
        base_url: &Url,
        frontier: &Frontier,
    ) -> Result<String, LinkRejection> {
        let url = resolve_link(href, base_url, self.strip_params).ok_or(LinkRejection::Invalid)?;

        if self.restrict_to_domain && !same_host(&url, &self.seed_host) {
            return Err(LinkRejection::OffDomain);
        }

        if has_ignored_extension(&url, &self.ignored_extensions) {
            return Err(LinkRejection::IgnoredExtension);
        }

        let url = String::from(url);
        if frontier.is_visited(&url) || frontier.is_pending(&url) {
            return Err(LinkRejection::AlreadyKnown);
        }

        Ok(url)
    }
}
