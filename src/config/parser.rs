use crate::config::types::SelectorConfig;
use crate::config::validation::validate_selectors;
use crate::ConfigError;
use std::path::Path;

/// Environment variable that overrides the default User-Agent
pub const USER_AGENT_ENV: &str = "GITBOOK_SCRAPER_USER_AGENT";

/// Loads custom CSS selectors from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML selector file
///
/// # Returns
///
/// * `Ok(SelectorConfig)` - Parsed selectors, every one of them valid CSS
/// * `Err(ConfigError)` - Failed to read, parse, or validate the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gitbook_scraper::config::load_selectors;
///
/// let selectors = load_selectors(Path::new("selectors.toml")).unwrap();
/// println!("{} custom nav selectors", selectors.nav.len());
/// ```
pub fn load_selectors(path: &Path) -> Result<SelectorConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_selectors(&content)
}

/// Parses selector overrides from TOML text
pub fn parse_selectors(content: &str) -> Result<SelectorConfig, ConfigError> {
    let selectors: SelectorConfig = toml::from_str(content)?;
    validate_selectors(&selectors)?;
    Ok(selectors)
}

/// Returns the User-Agent to use, honoring the environment override
pub fn user_agent_from_env() -> String {
    std::env::var(USER_AGENT_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(default_user_agent)
}

/// Default User-Agent: `gitbook-scraper/<version>`
pub fn default_user_agent() -> String {
    format!("gitbook-scraper/{}", env!("CARGO_PKG_VERSION"))
}
