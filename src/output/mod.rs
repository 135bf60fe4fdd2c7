//! Output module for crawl artifacts and reports
//!
//! This module handles:
//! - Writing one JSON artifact per successfully crawled URL
//! - Reporting ledger statistics for an existing crawl

mod result_store;
pub mod stats;

pub use result_store::{default_name_fn, NameFn, ResultStore, ARTIFACT_EXTENSION};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
