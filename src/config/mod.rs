//! Configuration module for Page-Harvest
//!
//! Settings come from defaults, an optional TOML file, and command-line
//! overrides, in that order. They are validated once, together with the seed
//! URL, into an immutable [`CrawlConfig`].
//!
//! # Example
//!
//! ```no_run
//! use page_harvest::config::{load_settings, CrawlConfig};
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("harvest.toml")).unwrap();
//! let config = CrawlConfig::new("https://example.com/", settings).unwrap();
//! println!("Crawler will use max depth: {}", config.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, CrawlSettings, FetchMode, PolitenessPolicy, TraversalOrder, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_settings, load_settings_with_hash, parse_settings};
