//! End-of-run summary
//!
//! Condenses a [`CrawlResult`] into counts and prints them for the user.

use crate::crawler::CrawlResult;
use std::collections::BTreeMap;
use std::path::Path;

/// Counters derived from a finished crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Size of the visited set
    pub pages_visited: usize,

    /// Records produced
    pub records: usize,

    /// Records whose content extraction stopped early
    pub extraction_errors: usize,

    /// Visited pages that produced no record
    pub failures: usize,

    /// Failure count per failure kind
    pub failures_by_kind: BTreeMap<&'static str, usize>,

    /// Last depth level processed
    pub depth_reached: u32,
}

impl CrawlSummary {
    pub fn from_result(result: &CrawlResult) -> Self {
        let mut failures_by_kind = BTreeMap::new();
        for failure in &result.failures {
            *failures_by_kind.entry(failure.error.kind()).or_insert(0) += 1;
        }

        Self {
            pages_visited: result.pages_visited,
            records: result.records.len(),
            extraction_errors: result
                .records
                .iter()
                .filter(|record| record.error.is_some())
                .count(),
            failures: result.failures.len(),
            failures_by_kind,
            depth_reached: result.depth_reached,
        }
    }

    /// Share of visited pages that produced a record, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.records as f64 / self.pages_visited as f64) * 100.0
    }
}

/// Formats a summary as plain text
pub fn format_summary(summary: &CrawlSummary, output: &Path) -> String {
    let mut text = String::from("=== Crawl Summary ===\n\n");

    text.push_str(&format!("  Pages visited: {}\n", summary.pages_visited));
    text.push_str(&format!(
        "  Records extracted: {} ({:.1}%)\n",
        summary.records,
        summary.success_rate()
    ));
    if summary.extraction_errors > 0 {
        text.push_str(&format!(
            "  Records with extraction errors: {}\n",
            summary.extraction_errors
        ));
    }
    text.push_str(&format!("  Depth reached: {}\n", summary.depth_reached));

    if summary.failures > 0 {
        text.push_str(&format!("\nFailed pages ({}):\n", summary.failures));
        for (kind, count) in &summary.failures_by_kind {
            text.push_str(&format!("  {}: {}\n", kind, count));
        }
    }

    text.push_str(&format!("\nOutput: {}\n", output.display()));
    text
}

/// Prints the summary to stdout
pub fn print_summary(result: &CrawlResult, output: &Path) {
    print!("{}", format_summary(&CrawlSummary::from_result(result), output));
}
