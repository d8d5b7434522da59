//! Robots.txt handling module
//!
//! The crawler reads the seed host's robots.txt once per crawl. What happens
//! with the rules is decided by [`PolitenessPolicy`]:
//!
//! - `Permissive`: rules are parsed but never consulted. Every URL is allowed.
//! - `Strict`: URLs disallowed for the configured user agent are skipped.
//!
//! A robots.txt that cannot be retrieved is never fatal; the crawl continues
//! with an allow-all rule set. URLs on other hosts are treated the same way,
//! since only the seed host's rules are ever read.

mod parser;

pub use parser::{product_token, ParsedRobots};

use crate::config::PolitenessPolicy;
use crate::url::same_host;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Errors that can occur while querying robots.txt
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("Failed to request {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("robots.txt at {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Fetches robots.txt for the host of `seed`
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `seed` - Any URL on the host whose robots.txt is wanted
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Successfully fetched and parsed robots.txt
/// * `Err(RobotsError)` - Unreachable, or answered with a non-success status
pub async fn fetch_robots(client: &Client, seed: &Url) -> Result<ParsedRobots, RobotsError> {
    let mut robots_url = seed.clone();
    robots_url.set_path("/robots.txt");
    robots_url.set_query(None);
    robots_url.set_fragment(None);
    let url = robots_url.to_string();

    let response = client
        .get(robots_url)
        .send()
        .await
        .map_err(|source| RobotsError::Request {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RobotsError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| RobotsError::Request {
            url: url.clone(),
            source,
        })?;

    Ok(ParsedRobots::from_content(&body))
}

/// Robots.txt rules combined with the policy that decides whether they apply
#[derive(Debug, Clone)]
pub struct RobotsGate {
    policy: PolitenessPolicy,
    robots: ParsedRobots,
    agent: String,
    host: Option<String>,
}

impl RobotsGate {
    /// Creates a gate from already-parsed rules
    pub fn new(policy: PolitenessPolicy, robots: ParsedRobots, user_agent: &str) -> Self {
        Self {
            policy,
            robots,
            agent: product_token(user_agent).to_string(),
            host: None,
        }
    }

    /// Limits the rules to URLs on `host`; other hosts are always permitted
    pub fn scoped_to(mut self, host: &str) -> Self {
        self.host = Some(host.to_lowercase());
        self
    }

    /// Fetches the seed host's robots.txt and builds a gate
    ///
    /// Retrieval failures are logged and replaced by an allow-all rule set.
    pub async fn load(
        client: &Client,
        seed: &Url,
        policy: PolitenessPolicy,
        user_agent: &str,
    ) -> Self {
        let robots = match fetch_robots(client, seed).await {
            Ok(robots) => {
                tracing::info!("Successfully parsed robots.txt for {}", seed);
                robots
            }
            Err(e) => {
                tracing::warn!("Could not read robots.txt, treating as allow-all: {}", e);
                ParsedRobots::allow_all()
            }
        };

        if policy == PolitenessPolicy::Permissive {
            tracing::info!("Politeness policy is permissive: robots.txt rules are bypassed");
        }

        let gate = Self::new(policy, robots, user_agent);
        match seed.host_str() {
            Some(host) => gate.scoped_to(host),
            None => gate,
        }
    }

    /// Checks whether a URL may be fetched under the configured policy
    pub fn permits(&self, url: &str) -> bool {
        match self.policy {
            PolitenessPolicy::Permissive => true,
            PolitenessPolicy::Strict => {
                if let Some(host) = &self.host {
                    let on_host = Url::parse(url).map_or(false, |url| same_host(&url, host));
                    if !on_host {
                        return true;
                    }
                }
                self.robots.is_allowed(url, &self.agent)
            }
        }
    }

    pub fn policy(&self) -> PolitenessPolicy {
        self.policy
    }
}
