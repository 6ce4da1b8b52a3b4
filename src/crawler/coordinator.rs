//! Scrape coordinator - main orchestration logic
//!
//! This module ties the pipeline together:
//! - Discovering the navigation tree from the seed page
//! - Applying the table-of-contents filter
//! - Fetching and extracting selected pages with bounded concurrency
//! - Assembling and writing the document, then reporting the outcome

use crate::config::{validate, ScrapeConfig};
use crate::crawler::fetcher::{build_http_client, Fetcher, RetryPolicy};
use crate::crawler::pacing::{Clock, PacingGate, StopSignal, TokioClock};
use crate::extract::{ExtractionKind, Extractor, PageContent, PageContext};
use crate::navigation::{apply_toc_filter, Discoverer};
use crate::output::{assemble, write_document, AssembleOptions, FailedPage, ScrapeReport};
use crate::url::normalize_url;
use crate::ScraperError;
use chrono::Utc;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use url::Url;

/// One selected page, in document order
#[derive(Debug, Clone)]
struct PageJob {
    index: usize,
    title: String,
    url: String,
    depth: usize,
}

/// What happened to one page
#[derive(Debug)]
enum PageOutcome {
    Done(PageContent),
    Failed { content: PageContent, reason: String },
    Cancelled,
}

/// Main scrape coordinator
#[derive(Debug)]
pub struct Coordinator {
    config: Arc<ScrapeConfig>,
    client: Client,
    gate: Arc<PacingGate>,
    discoverer: Discoverer,
    extractor: Arc<Extractor>,
    stop: StopSignal,
}

impl Coordinator {
    /// Creates a coordinator paced by the tokio timer
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Configuration is valid and the HTTP client is ready
    /// * `Err(ScraperError)` - Invalid configuration or client setup failure
    pub fn new(config: ScrapeConfig) -> Result<Self, ScraperError> {
        Self::with_clock(config, Arc::new(TokioClock))
    }

    /// Creates a coordinator whose pacing and backoff waits use `clock`
    pub fn with_clock(config: ScrapeConfig, clock: Arc<dyn Clock>) -> Result<Self, ScraperError> {
        validate(&config)?;

        let client = build_http_client(&config)?;
        let gate = Arc::new(PacingGate::new(config.delay(), clock));
        let discoverer = Discoverer::new(&config.selectors)?;
        let extractor = Arc::new(Extractor::new(&config.selectors)?);

        Ok(Self {
            config: Arc::new(config),
            client,
            gate,
            discoverer,
            extractor,
            stop: StopSignal::never(),
        })
    }

    /// Installs the signal that interrupts the run
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Runs the whole pipeline
    ///
    /// Page-level failures never abort the run; they become placeholders in
    /// the document and entries in the report. Only configuration, discovery
    /// and write failures are returned as errors.
    pub async fn run(&self) -> Result<ScrapeReport, ScraperError> {
        let started_at = Utc::now();
        let config = Arc::clone(&self.config);
        let timeout = config.timeout();

        let seed = normalize_url(&config.base_url)?;
        let fetcher = Arc::new(Fetcher::new(
            self.client.clone(),
            RetryPolicy::from_config(&config),
            self.stop.clone(),
        ));

        // Discovery
        let discovery = self
            .discoverer
            .discover(&fetcher, &self.gate, &seed, timeout, config.retries)
            .await?;
        let mut root = discovery.root;

        // Selection
        let matched = apply_toc_filter(&mut root, &config.toc_items);
        if config.has_toc_filter() {
            if matched == 0 {
                tracing::warn!(
                    "No navigation entries match the requested TOC items: {}",
                    config.toc_items.iter().cloned().collect::<Vec<_>>().join(", ")
                );
            } else {
                tracing::info!("{} navigation entries match the requested TOC items", matched);
            }
        }

        let jobs: Vec<PageJob> = root
            .selected_nodes()
            .into_iter()
            .enumerate()
            .map(|(index, node)| PageJob {
                index,
                title: node.title.clone(),
                url: node.url.clone(),
                depth: node.depth,
            })
            .collect();
        let total = jobs.len();
        tracing::info!("Fetching {} pages", total);

        // Fetch and extract
        let seed_url = Arc::new(discovery.seed_url);
        let seed_html = Arc::new(discovery.seed_html);
        let seed_base = Arc::new(discovery.seed_base);
        let semaphore = Arc::new(Semaphore::new(config.concurrency));
        let failures = Arc::new(AtomicUsize::new(0));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut stop = self.stop.clone();
        let mut join_set = JoinSet::new();
        let mut dispatched = vec![false; total];

        for job in jobs.iter().cloned() {
            if stop.is_stopped() {
                break;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
                _ = stop.stopped() => break,
            };
            let Ok(permit) = permit else {
                break;
            };

            dispatched[job.index] = true;

            let fetcher = Arc::clone(&fetcher);
            let gate = Arc::clone(&self.gate);
            let extractor = Arc::clone(&self.extractor);
            let seed_url = Arc::clone(&seed_url);
            let seed_html = Arc::clone(&seed_html);
            let seed_base = Arc::clone(&seed_base);
            let failures = Arc::clone(&failures);
            let completed = Arc::clone(&completed);
            let retries = config.retries;

            join_set.spawn(async move {
                let _permit = permit;

                let reused = (job.url == *seed_url).then(|| KnownPage {
                    html: seed_html.as_str(),
                    served_from: seed_base.as_str(),
                });
                let outcome =
                    process_page(&fetcher, &gate, &extractor, &job, reused, timeout, retries).await;

                if matches!(outcome, PageOutcome::Failed { .. }) {
                    failures.fetch_add(1, Ordering::SeqCst);
                }

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                if done % 10 == 0 || done == total {
                    tracing::info!("Progress: {}/{} pages processed", done, total);
                }

                (job.index, outcome)
            });
        }

        let mut outcomes: Vec<Option<PageOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => tracing::error!("Page task failed: {}", e),
            }
        }

        // Tally, in document order
        let mut contents: HashMap<String, PageContent> = HashMap::new();
        let mut failed_pages = Vec::new();
        let mut pages_fetched = 0;
        let mut pages_partial = 0;
        let mut pages_skipped = 0;
        let mut pages_lost = 0;

        for (job, outcome) in jobs.iter().zip(outcomes) {
            match outcome {
                Some(PageOutcome::Done(content)) => {
                    pages_fetched += 1;
                    if content.extraction_kind == ExtractionKind::Partial {
                        pages_partial += 1;
                    }
                    contents.insert(job.url.clone(), content);
                }
                Some(PageOutcome::Failed { content, reason }) => {
                    failed_pages.push(FailedPage {
                        title: job.title.clone(),
                        url: job.url.clone(),
                        reason,
                    });
                    contents.insert(job.url.clone(), content);
                }
                Some(PageOutcome::Cancelled) => pages_skipped += 1,
                None if dispatched[job.index] => {
                    pages_lost += 1;
                    failed_pages.push(FailedPage {
                        title: job.title.clone(),
                        url: job.url.clone(),
                        reason: "page task aborted".to_string(),
                    });
                }
                None => pages_skipped += 1,
            }
        }

        let pages_failed = failures.load(Ordering::SeqCst) + pages_lost;
        for page in &failed_pages {
            tracing::warn!("Page unavailable: {} <{}>: {}", page.title, page.url, page.reason);
        }

        // Assemble and write
        let options = AssembleOptions {
            generate_toc: config.generate_toc,
        };
        let document = assemble(&root, &contents, &options);
        write_document(&config.output_path, &document)?;

        let cancelled = self.stop.is_stopped();
        if cancelled {
            tracing::warn!(
                "Run interrupted: partial document written with {} pages skipped",
                pages_skipped
            );
        }

        let report = ScrapeReport {
            success: true,
            pages_fetched,
            pages_failed,
            pages_partial,
            pages_skipped,
            output_path: config.output_path.clone(),
            failed_pages,
            document_sha256: hex::encode(Sha256::digest(document.as_bytes())),
            started_at,
            finished_at: Utc::now(),
            cancelled,
        };

        tracing::info!(
            "Scrape completed: {} pages fetched, {} failed, {} partial",
            report.pages_fetched,
            report.pages_failed,
            report.pages_partial
        );

        Ok(report)
    }
}

/// A page body that was already fetched, with the URL it was served from
#[derive(Debug, Clone, Copy)]
struct KnownPage<'a> {
    html: &'a str,
    served_from: &'a str,
}

/// Fetches (unless the HTML is already known) and extracts one page
///
/// Links are rewritten against the URL the body was served from, which can
/// differ from the node URL after a redirect (e.g. to a trailing slash).
async fn process_page(
    fetcher: &Fetcher,
    gate: &PacingGate,
    extractor: &Extractor,
    job: &PageJob,
    known: Option<KnownPage<'_>>,
    timeout: std::time::Duration,
    retries: u32,
) -> PageOutcome {
    tracing::debug!("Processing page {} <{}>", job.title, job.url);

    let (html, served_from) = match known {
        Some(page) => (Ok(page.html.to_string()), page.served_from.to_string()),
        None => {
            let result = fetcher.fetch(gate, &job.url, timeout, retries).await;
            let served_from = result.final_url.clone();
            (result.into_html(), served_from)
        }
    };

    let html = match html {
        Ok(html) => html,
        Err(ScraperError::Cancelled { .. }) => return PageOutcome::Cancelled,
        Err(e) => {
            let reason = failure_reason(&e);
            return PageOutcome::Failed {
                content: PageContent::unavailable(&job.url, &reason),
                reason,
            };
        }
    };

    let page_url = match Url::parse(&served_from) {
        Ok(url) => url,
        Err(e) => {
            let reason = format!("invalid URL: {}", e);
            return PageOutcome::Failed {
                content: PageContent::unavailable(&job.url, &reason),
                reason,
            };
        }
    };

    let context = PageContext {
        title: &job.title,
        depth: job.depth,
    };
    let mut content = extractor.extract(&html, &page_url, context);
    content.url = job.url.clone();

    match content.extraction_kind {
        ExtractionKind::Empty => PageOutcome::Failed {
            content,
            reason: "no content could be extracted".to_string(),
        },
        _ => PageOutcome::Done(content),
    }
}

/// Short, human-readable reason for a page failure
fn failure_reason(error: &ScraperError) -> String {
    match error {
        ScraperError::HttpStatus { status, .. } => format!("HTTP {}", status),
        ScraperError::Network { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
