//! gitbook-scraper main entry point
//!
//! This is the command-line interface that turns a GitBook site into a
//! single markdown document.

use anyhow::Context;
use clap::Parser;
use gitbook_scraper::config::{load_selectors, ScrapeConfig, DEFAULT_OUTPUT_PATH};
use gitbook_scraper::crawler::{Coordinator, StopSignal};
use gitbook_scraper::output::print_report;
use gitbook_scraper::ScraperError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code used when the run was interrupted
const EXIT_INTERRUPTED: u8 = 130;

/// gitbook-scraper: GitBook documentation to a single markdown file
///
/// Discovers the site's navigation, fetches every page politely (paced,
/// with retries), extracts the main content and writes it out in
/// navigation order, optionally with a table of contents.
#[derive(Parser, Debug)]
#[command(name = "gitbook-scraper")]
#[command(version)]
#[command(about = "Scrape GitBook documentation into a single markdown file", long_about = None)]
struct Cli {
    /// Seed URL of the documentation site
    #[arg(value_name = "URL")]
    url: String,

    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,

    /// Generate a table of contents
    #[arg(long)]
    toc: bool,

    /// Delay between requests in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 0.5)]
    delay: f64,

    /// Number of retries for failed requests
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 10)]
    timeout: u64,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// TOML file with custom CSS selectors (`nav`, `content`, `strip` arrays; JSON selector files are not accepted)
    #[arg(long, value_name = "FILE")]
    selector_file: Option<PathBuf>,

    /// Only include these TOC items and their children (repeatable)
    #[arg(short = 't', long = "toc-items", value_name = "TITLE")]
    toc_items: Vec<String>,

    /// Maximum number of pages fetched at once
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// User-Agent header (overrides GITBOOK_SCRAPER_USER_AGENT)
    #[arg(long, value_name = "AGENT")]
    user_agent: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.debug);

    let quiet = cli.quiet;
    let config = build_config(cli)?;
    tracing::info!("Scraping {} into {}", config.base_url, config.output_path.display());

    let (handle, signal) = StopSignal::channel();
    let coordinator = Coordinator::new(config)?.with_stop_signal(signal.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with the pages collected so far");
            handle.stop();
        }
    });

    match coordinator.run().await {
        Ok(report) => {
            if !quiet {
                print_report(&report);
            }
            if report.cancelled {
                return Ok(ExitCode::from(EXIT_INTERRUPTED));
            }
            tracing::info!("Documentation saved to {}", report.output_path.display());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if signal.is_stopped() => {
            tracing::error!("Scrape interrupted: {}", e);
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            if let ScraperError::FatalDiscovery { source, .. } = &e {
                tracing::debug!("Discovery failure cause: {:?}", source);
            }
            Err(e.into())
        }
    }
}

/// Builds the run configuration from command-line arguments
fn build_config(cli: Cli) -> anyhow::Result<ScrapeConfig> {
    let mut config = ScrapeConfig::new(cli.url);
    config.output_path = cli.output;
    config.generate_toc = cli.toc;
    config.delay_seconds = cli.delay;
    config.retries = cli.retries;
    config.timeout_seconds = cli.timeout;
    config.debug = cli.debug;
    config.toc_items = cli
        .toc_items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    config.concurrency = cli.concurrency;

    if let Some(user_agent) = cli.user_agent {
        config.user_agent = user_agent;
    }

    if let Some(path) = cli.selector_file {
        tracing::info!("Loading custom selectors from: {}", path.display());
        config.selectors = load_selectors(&path)
            .with_context(|| format!("Failed to load selectors from {}", path.display()))?;
    }

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match (verbose, debug) {
            (0, false) => EnvFilter::new("gitbook_scraper=info,warn"),
            (0, true) | (1, _) => EnvFilter::new("gitbook_scraper=debug,info"),
            (2, _) => EnvFilter::new("gitbook_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
