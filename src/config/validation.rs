use crate::config::types::{Config, CrawlConfig, InvokerConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_invoker_config(&config.invoker)?;
    validate_crawl_config(&config.crawl)?;
    Ok(())
}

/// Validates the remote executor configuration
fn validate_invoker_config(config: &InvokerConfig) -> Result<(), ConfigError> {
    if config.function_name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "function_name cannot be empty".to_string(),
        ));
    }

    validate_endpoint("endpoint", &config.endpoint)?;
    validate_endpoint("reset_endpoint", &config.reset_endpoint)?;

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl loop configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.input_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "input_path cannot be empty".to_string(),
        ));
    }

    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }

    if config.max_requests_per_reset < 1 {
        return Err(ConfigError::Validation(format!(
            "max_requests_per_reset must be >= 1, got {}",
            config.max_requests_per_reset
        )));
    }

    if config.max_blocks_per_reset < 1 {
        return Err(ConfigError::Validation(format!(
            "max_blocks_per_reset must be >= 1, got {}",
            config.max_blocks_per_reset
        )));
    }

    Ok(())
}

/// Endpoints must be absolute http(s) URLs
fn validate_endpoint(name: &str, endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            name, endpoint
        )));
    }

    Ok(())
}
