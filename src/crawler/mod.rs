//! Crawler module for dispatching the backlog to the remote executor
//!
//! This module contains the core crawling logic, including:
//! - Reading the backlog of URLs
//! - Classifying each invocation result
//! - The session loop with identity rotation and pacing
//! - Overall crawl coordination

mod evaluator;
mod session;

pub use evaluator::{Evaluation, Evaluator};
pub use session::{RunSummary, Session, SessionSettings};

use crate::config::Config;
use crate::invoker::HttpInvoker;
use crate::output::default_name_fn;
use crate::CrawlError;
use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// Reads the backlog file
///
/// Lines are trimmed and blank lines are skipped. Order and duplicates are
/// preserved.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The backlog URLs in file order
/// * `Err(CrawlError::Backlog)` - The file is missing or unreadable
pub fn load_backlog(path: &Path) -> Result<Vec<String>, CrawlError> {
    let backlog_err = |source| CrawlError::Backlog {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(backlog_err)?);
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(backlog_err)?;
        let url = line.trim();
        if !url.is_empty() {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP invoker
/// 2. Open the session (backlog, ledgers, artifact directory)
/// 3. Run the session until the backlog is done or Ctrl-C is pressed
/// 4. Close the ledgers
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - Crawl finished or was interrupted
/// * `Err(CrawlError)` - Crawl could not start or was aborted
pub async fn run_crawl(config: Config) -> Result<RunSummary, CrawlError> {
    run_crawl_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Runs a crawl that stops early once `shutdown` completes
///
/// An interrupted session is marked aborted and its ledgers are still
/// closed. The in-flight invocation is dropped and its URL stays pending.
/// The summary of what was done before the interrupt is returned.
pub async fn run_crawl_until<F>(config: Config, shutdown: F) -> Result<RunSummary, CrawlError>
where
    F: Future<Output = ()>,
{
    let invoker = HttpInvoker::new(config.invoker.clone(), tracing::info_span!("invoker"))?;
    tracing::info!(
        "Invoking {} at {}",
        invoker.function_name(),
        config.invoker.endpoint
    );

    let mut session = Session::open(
        &config.crawl,
        invoker,
        Arc::new(default_name_fn),
        tracing::info_span!("crawl"),
    )?;

    let finished = tokio::select! {
        result = session.run() => Some(result),
        () = shutdown => None,
    };

    let result = match finished {
        Some(result) => result,
        None => {
            tracing::warn!("Interrupted, stopping the crawl");
            session.abort();
            Ok(session.summary().clone())
        }
    };

    session.close()?;
    result
}
