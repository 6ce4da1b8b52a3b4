//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `FetchState`: Pending, Retrying, Succeeded, FailedFinal
//! - `RetryTracker`: counts attempts and drives transitions from attempt outcomes

mod fetch_state;

pub use fetch_state::{AttemptOutcome, FetchState, RetryTracker};
