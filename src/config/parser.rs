use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use relay_crawler::config::load_config;
///
/// let config = load_config(Path::new("crawler.toml")).unwrap();
/// println!("Invoking: {}", config.invoker.function_name);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok(config)
}

/// Parses and validates configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs with different settings can be told apart in
/// the crawl log.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[invoker]
function-name = "crawler-prod-crawl"
endpoint = "https://fetch.example.com/invoke"
reset-endpoint = "https://fetch.example.com/reset"
region = "eu-west-1"
settle-seconds = 30

[crawl]
input-path = "./urls.txt"
output-dir = "./out"
sleep-seconds = 2
max-requests-per-reset = 500
max-blocks-per-reset = 5
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.invoker.function_name, "crawler-prod-crawl");
        assert_eq!(config.invoker.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.invoker.profile, None);
        assert_eq!(config.invoker.settle_seconds, 30);
        assert_eq!(config.crawl.output_dir, PathBuf::from("./out"));
        assert_eq!(config.crawl.sleep_seconds, 2);
        assert_eq!(config.crawl.max_requests_per_reset, 500);
        assert_eq!(config.crawl.max_blocks_per_reset, 5);
        assert!(!config.crawl.test_mode);
    }

    #[test]
    fn test_defaults_applied() {
        let config = parse_config(
            r#"
[invoker]
endpoint = "https://fetch.example.com/invoke"
reset-endpoint = "https://fetch.example.com/reset"
"#,
        )
        .unwrap();

        assert_eq!(config.invoker.function_name, "crawler-dev-crawl");
        assert_eq!(config.invoker.settle_seconds, 60);
        assert_eq!(config.crawl.input_path, PathBuf::from("urls.txt"));
        assert_eq!(config.crawl.output_dir, PathBuf::from("results"));
        assert_eq!(config.crawl.sleep_seconds, 0);
        assert_eq!(config.crawl.max_requests_per_reset, 1000);
        assert_eq!(config.crawl.max_blocks_per_reset, 10);
        assert!(config.crawl.request_delay().is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/crawler.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_endpoint_is_parse_error() {
        let result = parse_config("[invoker]\nfunction-name = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[invoker]
endpoint = "https://fetch.example.com/invoke"
reset-endpoint = "https://fetch.example.com/reset"

[crawl]
max-blocks-per-reset = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        assert_ne!(
            compute_config_hash(file1.path()).unwrap(),
            compute_config_hash(file2.path()).unwrap()
        );
    }
}
