//! URL handling module for Page-Harvest
//!
//! This module provides link resolution and normalization, hostname
//! extraction, and ignored-extension matching.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, same_host};
pub use matcher::has_ignored_extension;
pub use normalize::{normalize_link, resolve_link};
