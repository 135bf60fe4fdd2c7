//! Ledger module for persisting crawl progress
//!
//! This module records which URLs reached a final outcome so that a crawl can
//! be stopped and resumed without repeating work:
//! - a success ledger of crawled URLs
//! - a failure ledger of URLs that failed with a non-retryable status
//!
//! Both are append-only and are never rewritten or compacted.

mod file;
mod traits;

pub use file::FileLedger;
pub use traits::{Ledger, LedgerError, LedgerResult};

pub(crate) use file::read_lines;

/// One line of the failure ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub url: String,
    pub status_code: Option<u16>,
}

impl FailureRecord {
    pub fn new(url: &str, status_code: Option<u16>) -> Self {
        Self {
            url: url.to_string(),
            status_code,
        }
    }

    /// Parses a `url,status_code` line
    ///
    /// The line is split at its last comma so URLs containing commas survive.
    /// A line without a numeric code is kept as a bare URL.
    pub fn parse(line: &str) -> Self {
        match line.rsplit_once(',') {
            Some((url, code)) => match code.trim().parse::<u16>() {
                Ok(code) => Self::new(url, Some(code)),
                Err(_) => Self::new(line, None),
            },
            None => Self::new(line, None),
        }
    }

    pub fn to_line(&self) -> String {
        match self.status_code {
            Some(code) => format!("{},{}", self.url, code),
            None => self.url.clone(),
        }
    }
}
