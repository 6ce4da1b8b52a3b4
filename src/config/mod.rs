//! Configuration module for the scraper
//!
//! This module holds the run configuration, loads CSS selector overrides from
//! TOML files, and validates everything before the pipeline starts.
//!
//! # Example
//!
//! ```no_run
//! use gitbook_scraper::config::{load_selectors, validate, ScrapeConfig};
//! use std::path::Path;
//!
//! let mut config = ScrapeConfig::new("https://docs.example.com");
//! config.selectors = load_selectors(Path::new("selectors.toml")).unwrap();
//! validate(&config).unwrap();
//! ```

mod parser;
mod types;
mod validation;

/// Output file used when none is given
pub const DEFAULT_OUTPUT_PATH: &str = "documentation.md";

// Re-export types
pub use types::{ScrapeConfig, SelectorConfig};

// Re-export parser and validation functions
pub use parser::{
    default_user_agent, load_selectors, parse_selectors, user_agent_from_env, USER_AGENT_ENV,
};
pub use validation::{
    validate, validate_selectors, MAX_CONCURRENCY, MAX_RETRIES, MAX_TIMEOUT_SECONDS,
    MAX_WAIT_SECONDS,
};
