//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlOutcome`: classification of a single crawl attempt
//! - `SessionPhase`: lifecycle of a crawl session (idle, running, completed, aborted)
//! - `SessionCounters`: per-identity request and block counters

mod outcome;
mod session_state;

// Re-export main types
pub use outcome::{CrawlOutcome, OutcomeKind, Payload, STATUS_BLOCKED, STATUS_OK};
pub use session_state::{ResetPolicy, SessionCounters, SessionPhase};
