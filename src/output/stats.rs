//! Statistics generation from the crawl ledgers
//!
//! This module reads the ledgers, the backlog and the artifact directory of a
//! crawl without opening anything for writing, so it is safe to run next to a
//! live crawl.

use crate::config::CrawlConfig;
use crate::crawler::load_backlog;
use crate::ledger::{read_lines, FailureRecord};
use crate::CrawlError;
use std::collections::{BTreeMap, HashSet};

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// URLs in the backlog file
    pub backlog_total: usize,

    /// Backlog URLs present in neither ledger
    pub pending: usize,

    /// Distinct URLs in the success ledger
    pub crawled: usize,

    /// Distinct URLs in the failure ledger
    pub failed: usize,

    /// Failure ledger entries per status code (`None` for unparsable codes)
    pub failures_by_code: BTreeMap<Option<u16>, u64>,

    /// Files in the crawled directory
    pub artifacts: usize,
}

impl CrawlStatistics {
    /// Percentage of the backlog that reached a ledger
    pub fn completion_rate(&self) -> f64 {
        if self.backlog_total == 0 {
            return 0.0;
        }
        let done = self.backlog_total - self.pending;
        (done as f64 / self.backlog_total as f64) * 100.0
    }
}

/// Loads statistics for the crawl described by `config`
///
/// Missing ledgers count as empty.
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - The backlog or a ledger could not be read
pub fn load_statistics(config: &CrawlConfig) -> Result<CrawlStatistics, CrawlError> {
    let succeeded: HashSet<String> = read_lines(&config.success_ledger_path())?
        .into_iter()
        .collect();

    let mut failed = HashSet::new();
    let mut failures_by_code = BTreeMap::new();
    for line in read_lines(&config.failure_ledger_path())? {
        let record = FailureRecord::parse(&line);
        *failures_by_code.entry(record.status_code).or_insert(0) += 1;
        failed.insert(record.url);
    }

    let backlog = load_backlog(&config.input_path)?;
    let pending = backlog
        .iter()
        .filter(|url| !succeeded.contains(*url) && !failed.contains(*url))
        .count();

    let crawled_dir = config.crawled_dir();
    let artifacts = if crawled_dir.is_dir() {
        std::fs::read_dir(&crawled_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .count()
    } else {
        0
    };

    Ok(CrawlStatistics {
        backlog_total: backlog.len(),
        pending,
        crawled: succeeded.len(),
        failed: failed.len(),
        failures_by_code,
        artifacts,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Backlog URLs: {}", stats.backlog_total);
    println!("  Crawled: {}", stats.crawled);
    println!("  Failed: {}", stats.failed);
    println!("  Pending: {}", stats.pending);
    println!("  Artifacts on disk: {}", stats.artifacts);
    println!();

    if !stats.failures_by_code.is_empty() {
        println!("Failures by Status Code:");
        let mut codes: Vec<_> = stats.failures_by_code.iter().collect();
        codes.sort_by(|a, b| b.1.cmp(a.1));

        for (code, count) in codes {
            match code {
                Some(code) => println!("  {}: {}", code, count),
                None => println!("  unknown: {}", count),
            }
        }
        println!();
    }

    println!(
        "Completion: {:.1}% ({} / {} URLs in a ledger)",
        stats.completion_rate(),
        stats.backlog_total - stats.pending,
        stats.backlog_total
    );
}
