//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier (visited set, pending queue, depth counter)
//! - Fetching with timeout, retry and rate limiting
//! - Link discovery and filtering
//! - Content extraction into [`PageRecord`]s
//! - Overall crawl control

mod content;
mod controller;
mod fetcher;
mod frontier;
mod links;
mod render;

pub use content::{normalize_whitespace, ContentExtractor, ExtractError, PageRecord};
pub use controller::{run_crawl, CrawlResult, Crawler, FailedPage};
pub use fetcher::{
    build_headers, build_http_client, DirectFetch, FetchError, FetchGateway, FetchOutcome,
    PageSource, RetryPolicy, RETRY_STATUSES,
};
pub use frontier::Frontier;
pub use links::{LinkExtractor, LinkRejection};
pub use render::{extra_headers, launch_source};

#[cfg(feature = "render")]
pub use render::RenderedFetch;
