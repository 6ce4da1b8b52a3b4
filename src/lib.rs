//! GitBook Scraper: turns a GitBook documentation site into one markdown file
//!
//! This crate discovers a site's navigation tree, fetches every page through a
//! shared pacing gate with retry/backoff, extracts the main content of each page
//! as markdown, and assembles the fragments in navigation order with an optional
//! table of contents.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod navigation;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Could not parse {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Navigation discovery failed for {url}: {source}")]
    FatalDiscovery {
        url: String,
        #[source]
        source: Box<ScraperError>,
    },

    #[error("Failed to write output to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request cancelled for {url}")]
    Cancelled { url: String },

    #[error("Invalid fetch state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::FetchState,
        to: state::FetchState,
    },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl ScraperError {
    /// Returns true for failures worth another attempt (transport, 429, 5xx)
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{ScrapeConfig, SelectorConfig};
pub use crawler::{scrape, Coordinator, ScrapeReport};
pub use extract::{ExtractionKind, PageContent};
pub use navigation::NavNode;
pub use crate::url::normalize_url;
