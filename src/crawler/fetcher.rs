//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building HTTP clients with the configured user agent
//! - Pacing every attempt through the shared gate
//! - Retry logic with exponential backoff and `Retry-After` support
//! - Error classification into retriable and fatal failures

use crate::config::ScrapeConfig;
use crate::crawler::pacing::{PacingGate, StopSignal};
use crate::state::{AttemptOutcome, FetchState, RetryTracker};
use crate::ScraperError;
use chrono::{DateTime, Utc};
use reqwest::header::RETRY_AFTER;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::time::Duration;

/// Longest `Retry-After` delay that will be honored
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// How a fetch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// A 2xx response body is available
    Success,
    /// Every attempt failed with a retriable error
    RetriableError,
    /// A non-retriable failure (4xx other than 429, cancellation)
    FatalError,
}

/// Result of a fetch operation
#[derive(Debug)]
pub struct FetchResult {
    /// The requested URL
    pub url: String,

    /// URL the body was served from, after redirects (the requested URL
    /// when no response arrived). Relative links resolve against this.
    pub final_url: String,

    /// How the fetch ended
    pub status_kind: StatusKind,

    /// Response body, present on success
    pub html: Option<String>,

    /// Number of attempts made (first try included)
    pub attempt_count: u32,

    /// HTTP status of the last response, if any
    pub status: Option<u16>,

    /// The last failure, absent on success
    pub error: Option<ScraperError>,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        self.status_kind == StatusKind::Success
    }

    /// Converts into the body, or the error that made the page unavailable
    pub fn into_html(self) -> Result<String, ScraperError> {
        match (self.status_kind, self.html, self.error) {
            (StatusKind::Success, Some(html), _) => Ok(html),
            (_, _, Some(error)) => Err(error),
            (_, _, None) => Err(ScraperError::Network {
                url: self.url,
                message: "no response body".to_string(),
            }),
        }
    }
}

/// Backoff schedule for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self { base, cap }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.backoff_base(), config.backoff_cap())
    }

    /// Delay before retry number `retry_index` (0-based): `base × 2^retry_index`, capped
    pub fn backoff(&self, retry_index: u32) -> Duration {
        let factor = 1u32 << retry_index.min(16);
        self.base.saturating_mul(factor).min(self.cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Builds an HTTP client with the configured user agent and timeout
///
/// # Example
///
/// ```no_run
/// use gitbook_scraper::config::ScrapeConfig;
/// use gitbook_scraper::crawler::build_http_client;
///
/// let config = ScrapeConfig::new("https://docs.example.com");
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &ScrapeConfig) -> Result<Client, reqwest::Error> {
    let timeout = config.timeout();

    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// One attempt's classified result
enum Attempt {
    Body {
        status: u16,
        final_url: String,
        html: String,
    },
    Failed {
        status: Option<u16>,
        retry_after: Option<Duration>,
        error: ScraperError,
    },
}

/// Issues paced, retried GET requests
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | HTTP 429 | Retry, waiting `Retry-After` if present, else backoff |
/// | HTTP 5xx | Retry with backoff |
/// | Timeout / connection error | Retry with backoff |
/// | Other HTTP 4xx | Immediate FatalError |
/// | Stop signal | Immediate FatalError (cancelled) |
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    stop: StopSignal,
}

impl Fetcher {
    pub fn new(client: Client, policy: RetryPolicy, stop: StopSignal) -> Self {
        Self {
            client,
            policy,
            stop,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches a URL; never fails, the outcome is described by the result
    ///
    /// # Arguments
    ///
    /// * `gate` - The shared pacing gate every attempt passes through
    /// * `url` - The URL to fetch
    /// * `timeout` - Per-attempt timeout
    /// * `max_retries` - Retries after the first attempt
    pub async fn fetch(
        &self,
        gate: &PacingGate,
        url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> FetchResult {
        let mut tracker = RetryTracker::new(max_retries);
        let mut stop = self.stop.clone();
        let mut last_status = None;

        loop {
            if stop.is_stopped() {
                return self.cancelled(url, &mut tracker, last_status);
            }

            tokio::select! {
                _ = gate.wait() => {}
                _ = stop.stopped() => return self.cancelled(url, &mut tracker, last_status),
            }

            tracing::debug!("GET {} (attempt {})", url, tracker.attempts() + 1);

            let attempt = tokio::select! {
                attempt = self.attempt(url, timeout) => attempt,
                _ = stop.stopped() => return self.cancelled(url, &mut tracker, last_status),
            };

            let (outcome, retry_after, error) = match attempt {
                Attempt::Body {
                    status,
                    final_url,
                    html,
                } => {
                    if let Err(e) = tracker.record(AttemptOutcome::Success) {
                        tracing::error!("Fetch state error for {}: {}", url, e);
                    }
                    return FetchResult {
                        url: url.to_string(),
                        final_url,
                        status_kind: StatusKind::Success,
                        html: Some(html),
                        attempt_count: tracker.attempts(),
                        status: Some(status),
                        error: None,
                    };
                }
                Attempt::Failed {
                    status,
                    retry_after,
                    error,
                } => {
                    let outcome = if error.is_retriable() {
                        AttemptOutcome::Retriable
                    } else {
                        AttemptOutcome::Fatal
                    };
                    tracing::debug!("Attempt {} for {} failed: {}", tracker.attempts() + 1, url, error);
                    last_status = status;
                    (outcome, retry_after, error)
                }
            };

            let state = match tracker.record(outcome) {
                Ok(state) => state,
                Err(e) => {
                    tracing::error!("Fetch state error for {}: {}", url, e);
                    FetchState::FailedFinal
                }
            };

            if state == FetchState::FailedFinal {
                let status_kind = match outcome {
                    AttemptOutcome::Retriable => StatusKind::RetriableError,
                    _ => StatusKind::FatalError,
                };
                return FetchResult {
                    url: url.to_string(),
                    final_url: url.to_string(),
                    status_kind,
                    html: None,
                    attempt_count: tracker.attempts(),
                    status: last_status,
                    error: Some(error),
                };
            }

            let delay = retry_after.unwrap_or_else(|| self.policy.backoff(tracker.retries_used()));
            tracing::debug!(
                "Retrying {} in {:?} ({} of {} retries)",
                url,
                delay,
                tracker.retries_used() + 1,
                max_retries
            );

            tokio::select! {
                _ = gate.clock().sleep(delay) => {}
                _ = stop.stopped() => return self.cancelled(url, &mut tracker, last_status),
            }
        }
    }

    /// Sends one GET request and classifies the response
    async fn attempt(&self, url: &str, timeout: Duration) -> Attempt {
        let response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => return classify_transport_error(url, e),
        };

        let status = response.status();
        if status.is_success() {
            let final_url = response.url().to_string();
            return match response.text().await {
                Ok(html) => Attempt::Body {
                    status: status.as_u16(),
                    final_url,
                    html,
                },
                Err(e) => classify_transport_error(url, e),
            };
        }

        let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
            retry_after_from(&response)
        } else {
            None
        };

        Attempt::Failed {
            status: Some(status.as_u16()),
            retry_after,
            error: ScraperError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            },
        }
    }

    fn cancelled(&self, url: &str, tracker: &mut RetryTracker, status: Option<u16>) -> FetchResult {
        if let Err(e) = tracker.abandon() {
            tracing::debug!("Cancelled fetch for {} in state {}: {}", url, tracker.state(), e);
        }
        FetchResult {
            url: url.to_string(),
            final_url: url.to_string(),
            status_kind: StatusKind::FatalError,
            html: None,
            attempt_count: tracker.attempts(),
            status,
            error: Some(ScraperError::Cancelled {
                url: url.to_string(),
            }),
        }
    }
}

/// Classifies a reqwest error: builder/URL errors are fatal, the rest retriable
fn classify_transport_error(url: &str, e: reqwest::Error) -> Attempt {
    if e.is_builder() {
        return Attempt::Failed {
            status: None,
            retry_after: None,
            error: ScraperError::Reqwest(e),
        };
    }

    let message = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.to_string()
    };

    Attempt::Failed {
        status: None,
        retry_after: None,
        error: ScraperError::Network {
            url: url.to_string(),
            message,
        },
    }
}

fn retry_after_from(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, Utc::now())
}

/// Parses a `Retry-After` header value (delta-seconds or HTTP-date)
///
/// The result is clamped to [`MAX_RETRY_AFTER`]; dates in the past yield zero.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    let delay = if let Ok(seconds) = value.parse::<u64>() {
        Duration::from_secs(seconds)
    } else {
        let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
        (at - now).to_std().unwrap_or(Duration::ZERO)
    };

    Some(delay.min(MAX_RETRY_AFTER))
}
