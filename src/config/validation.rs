use crate::config::types::{ScrapeConfig, SelectorConfig};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Upper bound for `concurrency`
pub const MAX_CONCURRENCY: usize = 32;

/// Upper bound for `retries`
pub const MAX_RETRIES: u32 = 10;

/// Upper bound for the delay and backoff settings (seconds)
pub const MAX_WAIT_SECONDS: f64 = 3600.0;

/// Upper bound for `timeout_seconds`
pub const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Validates the entire configuration
pub fn validate(config: &ScrapeConfig) -> Result<(), ConfigError> {
    validate_base_url(&config.base_url)?;
    validate_output_path(config)?;
    validate_timing(config)?;
    validate_limits(config)?;
    validate_user_agent(&config.user_agent)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates the seed URL: HTTP(S) with a host
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid URL format '{}': {}. Must include scheme (e.g., https://)",
            base_url, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "URL '{}' must use http or https, got '{}'",
            base_url,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "URL '{}' has no host",
            base_url
        )));
    }

    Ok(())
}

fn validate_output_path(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.output_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates delay, timeout and backoff settings
fn validate_timing(config: &ScrapeConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("delay", config.delay_seconds),
        ("backoff base", config.backoff_base_seconds),
        ("backoff cap", config.backoff_cap_seconds),
    ] {
        if !value.is_finite() || !(0.0..=MAX_WAIT_SECONDS).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 0 and {} seconds, got {}",
                name, MAX_WAIT_SECONDS, value
            )));
        }
    }

    if config.timeout_seconds < 1 || config.timeout_seconds > MAX_TIMEOUT_SECONDS {
        return Err(ConfigError::Validation(format!(
            "timeout must be between 1 and {} seconds, got {}",
            MAX_TIMEOUT_SECONDS, config.timeout_seconds
        )));
    }

    if config.backoff_base_seconds > config.backoff_cap_seconds {
        return Err(ConfigError::Validation(format!(
            "backoff base ({}s) cannot exceed backoff cap ({}s)",
            config.backoff_base_seconds, config.backoff_cap_seconds
        )));
    }

    Ok(())
}

fn validate_limits(config: &ScrapeConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    if config.retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "retries must be <= {}, got {}",
            MAX_RETRIES, config.retries
        )));
    }

    Ok(())
}

fn validate_user_agent(user_agent: &str) -> Result<(), ConfigError> {
    if user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    if user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every custom selector is parseable CSS
pub fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ConfigError> {
    for selector in selectors
        .nav
        .iter()
        .chain(&selectors.content)
        .chain(&selectors.strip)
    {
        Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.clone(),
            message: format!("{:?}", e),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ScrapeConfig {
        let mut config = ScrapeConfig::new("https://docs.example.com");
        config.user_agent = "TestBot/1.0".to_string();
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("https://docs.example.com/guide").is_ok());
        assert!(validate_base_url("http://127.0.0.1:8080").is_ok());

        assert!(validate_base_url("not-a-url").is_err());
        assert!(validate_base_url("ftp://docs.example.com").is_err());
        assert!(validate_base_url("docs.example.com").is_err());
    }

    #[test]
    fn test_negative_delay_rejected() {
        let mut config = valid_config();
        config.delay_seconds = -1.0;
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));

        config.delay_seconds = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_delay_allowed() {
        let mut config = valid_config();
        config.delay_seconds = 0.0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_huge_waits_rejected() {
        let mut config = valid_config();
        config.delay_seconds = 1e20;
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));

        let mut config = valid_config();
        config.backoff_cap_seconds = 1e20;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.timeout_seconds = u64::MAX;
        assert!(validate(&config).is_err());

        let mut config = valid_config();
        config.delay_seconds = MAX_WAIT_SECONDS;
        config.backoff_cap_seconds = MAX_WAIT_SECONDS;
        config.timeout_seconds = MAX_TIMEOUT_SECONDS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.timeout_seconds = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = valid_config();
        config.concurrency = 0;
        assert!(validate(&config).is_err());
        config.concurrency = MAX_CONCURRENCY + 1;
        assert!(validate(&config).is_err());
        config.concurrency = MAX_CONCURRENCY;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_too_many_retries_rejected() {
        let mut config = valid_config();
        config.retries = MAX_RETRIES + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_backoff_base_above_cap_rejected() {
        let mut config = valid_config();
        config.backoff_base_seconds = 10.0;
        config.backoff_cap_seconds = 5.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_user_agent_rejected() {
        let mut config = valid_config();
        config.user_agent = "   ".to_string();
        assert!(validate(&config).is_err());
        config.user_agent = "Bot\n1.0".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let mut config = valid_config();
        config.selectors.nav = vec!["nav >".to_string()];
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidSelector { .. }
        ));
    }
}
