use crate::config::types::{Config, CrawlConfig, FetchConfig, PolicyConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_crawl_config(&config.crawl)?;
    validate_policy_config(&config.policy)?;

    if let Some(timeout) = config.import.fetch_timeout {
        validate_timeout("import.fetch-timeout", timeout)?;
    }
    if let Some(source) = &config.import.source_url {
        validate_http_url("import.source-url", source)?;
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    validate_timeout("timeout-ms", config.timeout_ms)?;
    validate_timeout("connect-timeout-ms", config.connect_timeout_ms)?;

    if config.batch_size < 1 || config.batch_size > 50 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and 50, got {}",
            config.batch_size
        )));
    }

    if config.max_stylesheet_bytes == 0 {
        return Err(ConfigError::Validation(
            "max-stylesheet-bytes must be > 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if let Some(proxy) = &config.proxy_url {
        validate_http_url("proxy-url", proxy)?;
    }

    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > 500 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and 500, got {}",
            config.max_pages
        )));
    }

    if config.concurrency < 1 || config.concurrency > 10 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 10, got {}",
            config.concurrency
        )));
    }

    Ok(())
}

/// Validates the domain list overrides
fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    for pattern in config
        .extra_tracking_domains
        .iter()
        .chain(config.extra_cdn_domains.iter())
    {
        validate_domain_pattern(pattern)?;
    }
    Ok(())
}

fn validate_timeout(name: &str, value: u64) -> Result<(), ConfigError> {
    if !(100..=120_000).contains(&value) {
        return Err(ConfigError::Validation(format!(
            "{} must be between 100ms and 120000ms, got {}ms",
            name, value
        )));
    }
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    validate_domain_string(domain)
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
