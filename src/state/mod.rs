//! State module for tracking crawl progress
//!
//! - `CrawlState`: the `Idle → Running → Terminated` lifecycle of one crawl

mod crawl_state;

pub use crawl_state::CrawlState;
