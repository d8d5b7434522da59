//! Output module for exporting crawl results
//!
//! This module handles:
//! - Writing page records to CSV
//! - Summarizing a finished crawl for the user

mod csv_export;
mod summary;

pub use csv_export::{export, export_csv, ExportError, DATE_FORMAT, MULTI_VALUE_SEPARATOR};
pub use summary::{format_summary, print_summary, CrawlSummary};
