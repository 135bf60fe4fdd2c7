//! Ledger traits and error types
//!
//! This module defines the trait interface for ledger backends and
//! associated error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Failed to open ledger {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to append to ledger {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Ledger entry contains a line break: {0:?}")]
    InvalidEntry(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Durable record of URLs whose outcome is final
///
/// A URL present in either the success or the failure set is never crawled
/// again. Appends must reach the backing store before the call returns.
pub trait Ledger {
    /// Returns true if the URL was recorded as a success or a failure
    fn contains(&self, url: &str) -> bool;

    /// Appends a successfully crawled URL
    fn record_success(&mut self, url: &str) -> LedgerResult<()>;

    /// Appends a URL that failed with a non-retryable status code
    fn record_failure(&mut self, url: &str, status_code: u16) -> LedgerResult<()>;

    /// Number of URLs in the success set
    fn success_count(&self) -> usize;

    /// Number of URLs in the failure set
    fn failure_count(&self) -> usize;
}
