//! Crawl controller - depth-by-depth crawl orchestration
//!
//! The controller owns every piece of mutable crawl state: the frontier, the
//! record sequence and the failure list. Each depth level runs as:
//! 1. Drain the pending batch from the frontier
//! 2. For each URL: check the page budget, mark visited, fetch
//! 3. On success: extract content, then links if the next depth is allowed
//! 4. Advance the depth (shuffle, cap) and re-check termination
//!
//! The fetch backend is released on every exit path.

use crate::config::{CrawlConfig, FetchMode};
use crate::crawler::content::{ContentExtractor, PageRecord};
use crate::crawler::fetcher::{
    build_http_client, DirectFetch, FetchError, FetchGateway, FetchOutcome, PageSource,
};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::LinkExtractor;
use crate::crawler::render;
use crate::robots::RobotsGate;
use crate::state::CrawlState;
use crate::HarvestError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use scraper::Html;
use url::Url;

/// A URL that was claimed but produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    pub url: String,
    pub error: FetchError,
}

/// Everything a finished crawl hands to the exporter
#[derive(Debug, Clone, Default)]
pub struct CrawlResult {
    /// One record per successfully fetched page, in discovery order
    pub records: Vec<PageRecord>,

    /// Pages that were visited but could not be fetched
    pub failures: Vec<FailedPage>,

    /// Size of the visited set at termination
    pub pages_visited: usize,

    /// Index of the last depth level that was processed
    pub depth_reached: u32,
}

impl CrawlResult {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why the crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    FrontierExhausted,
    DepthLimit,
    PageBudget,
}

impl Termination {
    fn describe(&self) -> &'static str {
        match self {
            Self::FrontierExhausted => "no URLs left to visit",
            Self::DepthLimit => "maximum depth reached",
            Self::PageBudget => "page budget exhausted",
        }
    }
}

/// Sequential depth-bounded crawler
pub struct Crawler {
    config: CrawlConfig,
    gateway: FetchGateway,
    content: ContentExtractor,
    links: LinkExtractor,
    robots: RobotsGate,
    state: CrawlState,
    records: Vec<PageRecord>,
    failures: Vec<FailedPage>,
    rng: StdRng,
}

impl Crawler {
    /// Creates a crawler over an already-selected fetch backend
    pub fn new(config: CrawlConfig, source: Box<dyn PageSource>, robots: RobotsGate) -> Self {
        let gateway = FetchGateway::from_config(source, &config);
        let content = ContentExtractor::new(config.content_selectors.clone());
        let links = LinkExtractor::from_config(&config);
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            gateway,
            content,
            links,
            robots,
            state: CrawlState::Idle,
            records: Vec::new(),
            failures: Vec::new(),
            rng,
        }
    }

    /// Builds the HTTP client, reads robots.txt and selects the fetch backend
    ///
    /// The rendering backend is launched last so that no browser is left
    /// running if an earlier step fails.
    pub async fn from_config(config: CrawlConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(&config)?;
        let robots = RobotsGate::load(
            &client,
            &config.seed_url,
            config.politeness,
            config.user_agent(),
        )
        .await;

        let source: Box<dyn PageSource> = match config.fetch_mode {
            FetchMode::Direct => Box::new(DirectFetch::new(client)),
            FetchMode::Rendered => render::launch_source(&config).await?,
        };

        let crawler = Self::new(config, source, robots);
        tracing::debug!("Using {} fetch backend", crawler.gateway.backend_name());
        Ok(crawler)
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Runs the crawl to completion
    ///
    /// Per-page failures never end the crawl; they are collected in
    /// [`CrawlResult::failures`]. The fetch backend is released whether or not
    /// the loop finished cleanly.
    pub async fn run(mut self) -> Result<CrawlResult, HarvestError> {
        let outcome = self.crawl().await;
        self.gateway.release().await;
        if !self.state.is_terminal() {
            self.state.transition(CrawlState::Terminated)?;
        }
        outcome
    }

    async fn crawl(&mut self) -> Result<CrawlResult, HarvestError> {
        let mut frontier = Frontier::initialize(
            self.config.seed_url.as_str(),
            self.config.max_pages,
            self.config.max_queue_size,
            self.config.traversal_order,
        );
        self.state.transition(CrawlState::Running)?;

        tracing::info!(
            "Starting crawl from {} with max depth {}",
            self.config.seed_url,
            self.config.max_depth
        );

        loop {
            if let Some(reason) = self.termination(&frontier) {
                tracing::info!("Stopping crawl: {}", reason.describe());
                break;
            }

            let follow_links = frontier.depth() < self.config.max_depth;
            let batch = frontier.next_batch();
            tracing::debug!(
                "Depth {}: processing {} URLs",
                frontier.depth(),
                batch.len()
            );

            for url in batch {
                if frontier.remaining_budget() == 0 {
                    tracing::info!(
                        "Reached maximum number of pages ({})",
                        self.config.max_pages
                    );
                    break;
                }

                if !frontier.mark_visited(&url) {
                    continue;
                }

                self.visit(&mut frontier, &url, follow_links).await;
            }

            frontier.advance_depth(&mut self.rng);
            tracing::info!(
                "Completed depth {}. Visited {} pages. Found {} new URLs.",
                frontier.depth(),
                frontier.visited_count(),
                frontier.pending_count()
            );
        }

        self.state.transition(CrawlState::Terminated)?;

        tracing::info!(
            "Crawl complete. Visited {} pages. Extracted data from {} pages.",
            frontier.visited_count(),
            self.records.len()
        );

        Ok(CrawlResult {
            records: std::mem::take(&mut self.records),
            failures: std::mem::take(&mut self.failures),
            pages_visited: frontier.visited_count(),
            depth_reached: frontier.depth().saturating_sub(1),
        })
    }

    /// Checked before each new depth level
    fn termination(&self, frontier: &Frontier) -> Option<Termination> {
        if !frontier.has_pending() {
            Some(Termination::FrontierExhausted)
        } else if frontier.depth() > self.config.max_depth {
            Some(Termination::DepthLimit)
        } else if frontier.remaining_budget() == 0 {
            Some(Termination::PageBudget)
        } else {
            None
        }
    }

    /// Fetches one claimed URL and folds the result into the crawl state
    async fn visit(&mut self, frontier: &mut Frontier, url: &str, follow_links: bool) {
        if !self.robots.permits(url) {
            tracing::info!("Skipping {}: disallowed by robots.txt", url);
            self.failures.push(FailedPage {
                url: url.to_string(),
                error: FetchError::Disallowed {
                    url: url.to_string(),
                },
            });
            return;
        }

        match self.gateway.fetch(url).await {
            FetchOutcome::Fetched { body, .. } => {
                let (record, links) = self.process_document(&body, url, frontier, follow_links);
                self.records.push(record);

                let accepted = links
                    .iter()
                    .filter(|link| frontier.try_enqueue(link))
                    .count();
                tracing::debug!("Queued {} new links from {}", accepted, url);
            }
            FetchOutcome::Failed { error, attempts } => {
                tracing::warn!(
                    "Giving up on {} after {} attempt(s): {}",
                    url,
                    attempts,
                    error
                );
                self.failures.push(FailedPage {
                    url: url.to_string(),
                    error,
                });
            }
        }
    }

    /// Parses a fetched page and runs both extractors over it
    ///
    /// Kept synchronous: the parsed tree must not live across an await point.
    fn process_document(
        &self,
        body: &str,
        url: &str,
        frontier: &Frontier,
        follow_links: bool,
    ) -> (PageRecord, Vec<String>) {
        let mut document = Html::parse_document(body);
        let record = self.content.extract(&mut document, url);

        if !follow_links {
            return (record, Vec::new());
        }

        let links = match Url::parse(url) {
            Ok(base) => self.links.extract(&document, &base, frontier),
            Err(e) => {
                tracing::warn!("Cannot resolve links on {}: {}", url, e);
                Vec::new()
            }
        };

        (record, links)
    }
}

/// Runs a complete crawl for `config`
///
/// # Example
///
/// ```no_run
/// use page_harvest::config::{CrawlConfig, CrawlSettings};
/// use page_harvest::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CrawlConfig::new("https://example.com", CrawlSettings::default())?;
/// let result = run_crawl(config).await?;
/// println!("{} pages", result.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: CrawlConfig) -> Result<CrawlResult, HarvestError> {
    Crawler::from_config(config).await?.run().await
}
