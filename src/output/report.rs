//! Run report
//!
//! This module describes the outcome of a scrape and prints it as a
//! human-readable summary once the document has been written.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::PathBuf;

/// A page whose content could not be included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedPage {
    /// Navigation title
    pub title: String,

    /// Page URL
    pub url: String,

    /// Why the page is missing
    pub reason: String,
}

/// Outcome of a scrape
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    /// The document was written (page failures do not clear this)
    pub success: bool,

    /// Pages fetched and extracted with usable content
    pub pages_fetched: usize,

    /// Pages replaced by a placeholder (fetch failure or no content)
    pub pages_failed: usize,

    /// Pages whose content was only partially converted
    pub pages_partial: usize,

    /// Selected pages never started because the run was interrupted
    pub pages_skipped: usize,

    /// Where the document was written
    pub output_path: PathBuf,

    /// Details of each failed page, in document order
    pub failed_pages: Vec<FailedPage>,

    /// Hex-encoded SHA-256 of the written document
    pub document_sha256: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the document was written
    pub finished_at: DateTime<Utc>,

    /// The run was interrupted before every page was processed
    pub cancelled: bool,
}

impl ScrapeReport {
    /// Total pages selected for the document
    pub fn pages_total(&self) -> usize {
        self.pages_fetched + self.pages_failed + self.pages_skipped
    }

    /// Calculates the page success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.pages_total();
        if total == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / total as f64) * 100.0
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

/// Formats the report as plain text
pub fn format_report(report: &ScrapeReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Scrape Summary ===\n");
    let _ = writeln!(out, "Output: {}", report.output_path.display());
    let _ = writeln!(out, "SHA-256: {}", report.document_sha256);
    let _ = writeln!(
        out,
        "Duration: {} seconds",
        report.duration_seconds().max(0)
    );
    if report.cancelled {
        let _ = writeln!(out, "Status: interrupted (partial document)");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Pages:");
    let _ = writeln!(
        out,
        "  Fetched: {} ({:.1}%)",
        report.pages_fetched,
        report.success_rate()
    );
    let _ = writeln!(out, "  Partial: {}", report.pages_partial);
    let _ = writeln!(out, "  Failed: {}", report.pages_failed);
    if report.pages_skipped > 0 {
        let _ = writeln!(out, "  Skipped: {}", report.pages_skipped);
    }

    if !report.failed_pages.is_empty() {
        let _ = writeln!(out, "\nFailed pages:");
        for page in &report.failed_pages {
            let _ = writeln!(out, "  {} <{}>: {}", page.title, page.url, page.reason);
        }
    }

    out
}

/// Prints the report to stdout
pub fn print_report(report: &ScrapeReport) {
    print!("{}", format_report(report));
}
