//! Crawl session - the adaptive loop over the backlog
//!
//! This module contains the main crawl loop, which:
//! - Skips URLs already present in either ledger
//! - Invokes the remote executor for everything else, one URL at a time
//! - Counts requests and blocked answers per network identity
//! - Rotates the identity once either counter reaches its threshold
//! - Paces requests with an optional fixed delay

use crate::config::CrawlConfig;
use crate::crawler::evaluator::Evaluator;
use crate::crawler::load_backlog;
use crate::invoker::Invoker;
use crate::ledger::{FileLedger, Ledger};
use crate::output::{NameFn, ResultStore};
use crate::state::{OutcomeKind, ResetPolicy, SessionCounters, SessionPhase};
use crate::CrawlError;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// How often (in processed URLs) progress is logged
const PROGRESS_INTERVAL: u64 = 10;

/// Loop settings of a session
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSettings {
    pub policy: ResetPolicy,
    pub request_delay: Option<Duration>,
    pub test_mode: bool,
}

impl SessionSettings {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            policy: ResetPolicy {
                max_requests_per_reset: config.max_requests_per_reset,
                max_blocks_per_reset: config.max_blocks_per_reset,
            },
            request_delay: config.request_delay(),
            test_mode: config.test_mode,
        }
    }
}

/// Tally of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// URLs in the backlog
    pub total: u64,
    /// URLs skipped because a ledger already held them
    pub skipped: u64,
    pub succeeded: u64,
    pub blocked: u64,
    /// URLs recorded as permanent failures
    pub failed: u64,
    /// URLs left for the next run after a transport failure
    pub retryable: u64,
    /// Identity resets performed
    pub resets: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    /// URLs that were actually sent to the invoker
    pub fn invoked(&self) -> u64 {
        self.succeeded + self.blocked + self.failed + self.retryable
    }

    fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Success => self.succeeded += 1,
            OutcomeKind::Blocked => self.blocked += 1,
            OutcomeKind::PermanentFailure => self.failed += 1,
            OutcomeKind::TransportFailure => self.retryable += 1,
        }
    }
}

/// Crawl session over one backlog
///
/// The session owns the ledger handles for its whole life. They are released
/// by [`Session::close`], or when the session is dropped.
pub struct Session<I: Invoker> {
    invoker: I,
    ledger: FileLedger,
    store: ResultStore,
    evaluator: Evaluator,
    backlog: Vec<String>,
    settings: SessionSettings,
    counters: SessionCounters,
    phase: SessionPhase,
    summary: RunSummary,
    started_at: Option<Instant>,
    span: tracing::Span,
}

impl<I: Invoker> Session<I> {
    /// Opens a session for the crawl described by `config`
    ///
    /// Creates the output and crawled directories, reads the backlog and
    /// opens both ledgers. Any failure here aborts before anything is invoked.
    ///
    /// # Arguments
    ///
    /// * `config` - Paths, thresholds and pacing
    /// * `invoker` - The remote executor
    /// * `name_fn` - Maps a URL to its artifact file name
    /// * `span` - Span every session event is recorded under
    pub fn open(
        config: &CrawlConfig,
        invoker: I,
        name_fn: NameFn,
        span: tracing::Span,
    ) -> Result<Self, CrawlError> {
        let _enter = span.enter();
        tracing::info!("Creating the crawler...");

        std::fs::create_dir_all(&config.output_dir)?;
        let backlog = load_backlog(&config.input_path)?;
        let store = ResultStore::new(&config.crawled_dir(), name_fn)?;
        let ledger =
            FileLedger::open(&config.success_ledger_path(), &config.failure_ledger_path())?;
        tracing::debug!(
            "Ledgers: {} and {}, artifacts in {}",
            ledger.success_path().display(),
            ledger.failure_path().display(),
            store.dir().display()
        );

        drop(_enter);
        Ok(Self::new(
            backlog,
            ledger,
            store,
            invoker,
            SessionSettings::from_config(config),
            span,
        ))
    }

    /// Creates a session from already opened parts
    pub fn new(
        backlog: Vec<String>,
        ledger: FileLedger,
        store: ResultStore,
        invoker: I,
        settings: SessionSettings,
        span: tracing::Span,
    ) -> Self {
        Self {
            invoker,
            ledger,
            store,
            evaluator: Evaluator::new(settings.test_mode),
            backlog,
            settings,
            counters: SessionCounters::new(),
            phase: SessionPhase::Idle,
            summary: RunSummary::default(),
            started_at: None,
            span,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn ledger(&self) -> &FileLedger {
        &self.ledger
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn backlog(&self) -> &[String] {
        &self.backlog
    }

    /// Summary so far; complete once the session is terminal
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Backlog URLs not yet in a ledger
    pub fn pending(&self) -> usize {
        self.backlog
            .iter()
            .filter(|url| !self.ledger.contains(url))
            .count()
    }

    /// Runs the session over the whole backlog
    ///
    /// Per-URL failures never stop the loop. Only a ledger append failure or
    /// a failed identity reset does, leaving the session `Aborted`.
    pub async fn run(&mut self) -> Result<RunSummary, CrawlError> {
        let span = self.span.clone();
        async {
            self.transition(SessionPhase::Running)?;
            self.started_at = Some(Instant::now());
            self.summary.total = self.backlog.len() as u64;

            tracing::info!(
                "Start crawling: {} URLs, {} pending",
                self.backlog.len(),
                self.pending()
            );

            match self.crawl_backlog().await {
                Ok(()) => {
                    self.finish(SessionPhase::Completed)?;
                    let s = &self.summary;
                    tracing::info!(
                        "Crawl completed: {} succeeded, {} failed, {} blocked, {} retryable, {} skipped, {} resets in {:?}",
                        s.succeeded,
                        s.failed,
                        s.blocked,
                        s.retryable,
                        s.skipped,
                        s.resets,
                        s.elapsed
                    );
                    Ok(self.summary.clone())
                }
                Err(e) => {
                    tracing::error!("Crawl aborted: {}", e);
                    self.finish(SessionPhase::Aborted)?;
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Marks a session stopped from outside (e.g. by an interrupt) as aborted
    pub fn abort(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = SessionPhase::Aborted;
            if let Some(started) = self.started_at {
                self.summary.elapsed = started.elapsed();
            }
        }
    }

    /// Releases the ledger files
    pub fn close(self) -> Result<(), CrawlError> {
        let _enter = self.span.enter();
        self.ledger.close()?;
        Ok(())
    }

    async fn crawl_backlog(&mut self) -> Result<(), CrawlError> {
        let mut processed: u64 = 0;

        for index in 0..self.backlog.len() {
            let url = self.backlog[index].clone();

            // Crawled or failed before
            if self.ledger.contains(&url) {
                self.summary.skipped += 1;
                continue;
            }

            let result = self.invoker.invoke(&url).await;
            let evaluation = self
                .evaluator
                .evaluate(&url, result, &mut self.ledger, &self.store)?;
            self.summary.record(evaluation.kind);

            processed += 1;
            if processed % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {}/{} URLs, status_code={}, count_requests={}, count_forbidden={}",
                    index + 1,
                    self.backlog.len(),
                    evaluation
                        .status_code
                        .map_or_else(|| "-".to_string(), |c| c.to_string()),
                    self.counters.requests_since_reset,
                    self.counters.blocks_since_reset
                );
            }

            if evaluation.kind.is_blocked() {
                if self.counters.record_block(&self.settings.policy) {
                    tracing::debug!(
                        "Got {} forbidden requests in this session",
                        self.settings.policy.max_blocks_per_reset
                    );
                    self.reset_identity().await?;
                }
                continue;
            }

            if self.counters.record_request(&self.settings.policy) {
                tracing::debug!(
                    "Sent {} requests in this session",
                    self.settings.policy.max_requests_per_reset
                );
                self.reset_identity().await?;
            }

            if let Some(delay) = self.settings.request_delay {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(())
    }

    // A failed reset ends the run, as does a failed ledger append.
    async fn reset_identity(&mut self) -> Result<(), CrawlError> {
        self.invoker.reset_identity().await?;
        self.counters.reset();
        self.summary.resets += 1;
        tracing::info!("Identity reset ({} so far)", self.summary.resets);
        Ok(())
    }

    fn finish(&mut self, phase: SessionPhase) -> Result<(), CrawlError> {
        if let Some(started) = self.started_at {
            self.summary.elapsed = started.elapsed();
        }
        self.transition(phase)
    }

    fn transition(&mut self, next: SessionPhase) -> Result<(), CrawlError> {
        if !self.phase.can_transition_to(next) {
            return Err(CrawlError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }
}
