//! Crawler module for page fetching and scrape orchestration
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry logic and backoff
//! - Request pacing through a single shared gate
//! - Cancellation of pending waits on interrupt
//! - Overall scrape coordination

mod coordinator;
mod fetcher;
mod pacing;

pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, parse_retry_after, FetchResult, Fetcher, RetryPolicy, StatusKind,
    MAX_RETRY_AFTER,
};
pub use pacing::{Clock, ManualClock, PacingGate, Sleep, StopHandle, StopSignal, TokioClock};

pub use crate::output::{FailedPage, ScrapeReport};

use crate::config::ScrapeConfig;
use crate::ScraperError;

/// Runs a complete scrape operation
///
/// This is the main entry point. It will:
/// 1. Validate the configuration
/// 2. Discover the navigation tree from the seed page
/// 3. Apply the table-of-contents filter
/// 4. Fetch and extract every selected page
/// 5. Assemble and write the document
///
/// # Arguments
///
/// * `config` - The scrape configuration
///
/// # Returns
///
/// * `Ok(ScrapeReport)` - The document was written (individual pages may have failed)
/// * `Err(ScraperError)` - Configuration, discovery or write failure
pub async fn scrape(config: ScrapeConfig) -> Result<ScrapeReport, ScraperError> {
    Coordinator::new(config)?.run().await
}
