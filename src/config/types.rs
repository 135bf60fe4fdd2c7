use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Relay-Crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub invoker: InvokerConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
}

/// Remote executor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InvokerConfig {
    /// Name of the remote function that fetches a URL
    #[serde(rename = "function-name", default = "default_function_name")]
    pub function_name: String,

    /// Endpoint that runs one fetch per request
    pub endpoint: String,

    /// Endpoint that forces the function to cold start on a new address
    #[serde(rename = "reset-endpoint")]
    pub reset_endpoint: String,

    /// Credentials profile forwarded with reset requests
    #[serde(default)]
    pub profile: Option<String>,

    /// Region forwarded with reset requests
    #[serde(default)]
    pub region: Option<String>,

    /// Time to wait after a reset before invoking again (seconds)
    #[serde(rename = "settle-seconds", default = "default_settle_seconds")]
    pub settle_seconds: u64,

    /// Per-invocation timeout (seconds)
    #[serde(rename = "timeout-seconds", default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// File with one URL per line
    #[serde(rename = "input-path", default = "default_input_path")]
    pub input_path: PathBuf,

    /// Directory holding ledgers, artifacts and the log file
    #[serde(rename = "output-dir", default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Pause between requests (seconds)
    #[serde(rename = "sleep-seconds", default)]
    pub sleep_seconds: u64,

    /// Requests sent before the identity is rotated
    #[serde(
        rename = "max-requests-per-reset",
        default = "default_max_requests_per_reset"
    )]
    pub max_requests_per_reset: u32,

    /// Blocked answers tolerated before the identity is rotated
    #[serde(
        rename = "max-blocks-per-reset",
        default = "default_max_blocks_per_reset"
    )]
    pub max_blocks_per_reset: u32,

    /// Write artifacts but never touch the ledgers
    #[serde(rename = "test-mode", default)]
    pub test_mode: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            input_path: default_input_path(),
            output_dir: default_output_dir(),
            sleep_seconds: 0,
            max_requests_per_reset: default_max_requests_per_reset(),
            max_blocks_per_reset: default_max_blocks_per_reset(),
            test_mode: false,
        }
    }
}

impl InvokerConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl CrawlConfig {
    /// Directory that receives one JSON artifact per crawled URL
    pub fn crawled_dir(&self) -> PathBuf {
        self.output_dir.join("crawled")
    }

    /// Append-only list of successfully crawled URLs
    pub fn success_ledger_path(&self) -> PathBuf {
        self.output_dir.join("crawled-urls.txt")
    }

    /// Append-only list of `url,status_code` pairs
    pub fn failure_ledger_path(&self) -> PathBuf {
        self.output_dir.join("failed-urls.txt")
    }

    pub fn log_path(&self) -> PathBuf {
        self.output_dir.join("crawl.log")
    }

    pub fn request_delay(&self) -> Option<Duration> {
        (self.sleep_seconds > 0).then(|| Duration::from_secs(self.sleep_seconds))
    }
}

fn default_function_name() -> String {
    "crawler-dev-crawl".to_string()
}

fn default_settle_seconds() -> u64 {
    60
}

fn default_timeout_seconds() -> u64 {
    900
}

fn default_input_path() -> PathBuf {
    PathBuf::from("urls.txt")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_max_requests_per_reset() -> u32 {
    1000
}

fn default_max_blocks_per_reset() -> u32 {
    10
}
