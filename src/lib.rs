//! Relay-Crawler: a resumable crawl controller for a remote fetch executor
//!
//! This crate dispatches URL-fetch jobs to a remote serverless executor one at
//! a time, records every final outcome in append-only ledgers so an
//! interrupted crawl can be resumed, and rotates the executor's network
//! identity when it starts getting blocked.

pub mod config;
pub mod crawler;
pub mod invoker;
pub mod ledger;
pub mod output;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Relay-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read backlog {path}: {source}")]
    Backlog {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("Invoker error: {0}")]
    Invoke(#[from] invoker::InvokeError),

    #[error("Invalid session transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::SessionPhase,
        to: state::SessionPhase,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Result type alias for Relay-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Evaluator, RunSummary, Session};
pub use invoker::{HttpInvoker, Invoker, RawResponse};
pub use ledger::{FileLedger, Ledger};
pub use output::{default_name_fn, NameFn, ResultStore};
pub use state::{CrawlOutcome, OutcomeKind, SessionCounters, SessionPhase};
