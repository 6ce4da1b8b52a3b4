//! Retry state machine for a single fetch
//!
//! Each call to the fetcher walks one `RetryTracker` from `Pending` to either
//! `Succeeded` or `FailedFinal`, passing through `Retrying` once per retry.
use crate::ScraperError;
use std::fmt;

/// Represents the current state of one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchState {
    // ===== Active States =====
    /// No attempt has been made yet
    Pending,

    /// A previous attempt failed with a retriable error; another attempt follows
    Retrying,

    // ===== Terminal States =====
    /// An attempt returned a usable response
    Succeeded,

    /// Gave up: fatal error or retries exhausted
    FailedFinal,
}

impl FetchState {
    /// Returns true if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedFinal)
    }

    /// Returns true if this state allows moving to `next`
    pub fn can_transition_to(&self, next: FetchState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Retrying)
                | (Self::Pending, Self::Succeeded)
                | (Self::Pending, Self::FailedFinal)
                | (Self::Retrying, Self::Retrying)
                | (Self::Retrying, Self::Succeeded)
                | (Self::Retrying, Self::FailedFinal)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Retrying => "retrying",
            Self::Succeeded => "succeeded",
            Self::FailedFinal => "failed_final",
        }
    }
}

impl fmt::Display for FetchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of a single attempt's outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Retriable,
    Fatal,
}

/// Drives a fetch through its states and counts attempts
#[derive(Debug, Clone)]
pub struct RetryTracker {
    state: FetchState,
    attempts: u32,
    max_retries: u32,
}

impl RetryTracker {
    /// `max_retries` counts retries after the first attempt, so up to
    /// `max_retries + 1` attempts are made in total.
    pub fn new(max_retries: u32) -> Self {
        Self {
            state: FetchState::Pending,
            attempts: 0,
            max_retries,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Number of retries already scheduled (0 before the first retry)
    pub fn retries_used(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Records the outcome of the attempt just made and returns the new state
    pub fn record(&mut self, outcome: AttemptOutcome) -> Result<FetchState, ScraperError> {
        self.attempts += 1;

        let next = match outcome {
            AttemptOutcome::Success => FetchState::Succeeded,
            AttemptOutcome::Fatal => FetchState::FailedFinal,
            AttemptOutcome::Retriable if self.attempts > self.max_retries => {
                FetchState::FailedFinal
            }
            AttemptOutcome::Retriable => FetchState::Retrying,
        };

        self.transition(next)?;
        Ok(next)
    }

    /// Forces the tracker into `FailedFinal` (e.g. on cancellation)
    pub fn abandon(&mut self) -> Result<(), ScraperError> {
        self.transition(FetchState::FailedFinal)
    }

    fn transition(&mut self, next: FetchState) -> Result<(), ScraperError> {
        if !self.state.can_transition_to(next) {
            return Err(ScraperError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}
