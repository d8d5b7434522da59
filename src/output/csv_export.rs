//! CSV export of crawl records
//!
//! One header row, then one row per [`PageRecord`] in discovery order.
//! Heading sequences are flattened with [`MULTI_VALUE_SEPARATOR`].

use crate::crawler::{CrawlResult, PageRecord};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Joins multi-value fields such as headings into one cell
pub const MULTI_VALUE_SEPARATOR: &str = " | ";

/// Timestamp format of the `date_crawled` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors that can occur while writing the export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One CSV row; field order defines the column order
#[derive(Debug, Serialize)]
struct FlatRecord<'a> {
    url: &'a str,
    title: &'a str,
    meta_description: &'a str,
    h1: String,
    h2: String,
    h3_plus: String,
    body_text: &'a str,
    date_crawled: String,
    errors: &'a str,
}

impl<'a> From<&'a PageRecord> for FlatRecord<'a> {
    fn from(record: &'a PageRecord) -> Self {
        Self {
            url: &record.url,
            title: &record.title,
            meta_description: &record.meta_description,
            h1: record.h1.join(MULTI_VALUE_SEPARATOR),
            h2: record.h2.join(MULTI_VALUE_SEPARATOR),
            h3_plus: record.h3_plus.join(MULTI_VALUE_SEPARATOR),
            body_text: &record.body_text,
            date_crawled: record.captured_at.format(DATE_FORMAT).to_string(),
            errors: record.error.as_deref().unwrap_or_default(),
        }
    }
}

/// Writes every record in `result` to `path`
///
/// The header row is derived from the row struct and written with the first
/// record, so an empty result produces an empty file.
///
/// # Returns
///
/// * `Ok(usize)` - Number of rows written
/// * `Err(ExportError)` - The file could not be created or written
pub fn export_csv(result: &CrawlResult, path: &Path) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_path(path)?;

    for record in &result.records {
        writer.serialize(FlatRecord::from(record))?;
    }
    writer.flush()?;

    Ok(result.records.len())
}

/// Exports `result` to `path`, reporting failure as `false`
///
/// An empty result is not an error: nothing is written and `true` is
/// returned.
pub fn export(result: &CrawlResult, path: &Path) -> bool {
    if result.is_empty() {
        tracing::warn!("No data to export");
        return true;
    }

    match export_csv(result, path) {
        Ok(rows) => {
            tracing::info!("Data exported to {} ({} rows)", path.display(), rows);
            true
        }
        Err(e) => {
            tracing::error!("Error exporting data to {}: {}", path.display(), e);
            false
        }
    }
}
