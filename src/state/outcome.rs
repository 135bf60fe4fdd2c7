/// Crawl outcome definitions
///
/// Every invocation result is classified into exactly one of these outcomes,
/// and each outcome maps to exactly one persistence action.
use serde_json::{Map, Value};
use std::fmt;

/// Structured result returned by the remote executor for one URL
pub type Payload = Map<String, Value>;

/// Status code that marks a URL as fetched successfully
pub const STATUS_OK: u16 = 200;

/// Status code treated as a ban on the executor's current address
pub const STATUS_BLOCKED: u16 = 403;

/// Classified result of one crawl attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    /// The executor fetched the page; payload is persisted as an artifact
    Success(Payload),

    /// The target refused our current address; retried on the next run
    Blocked(u16),

    /// The target answered with a final error; recorded and never retried
    PermanentFailure(u16),

    /// The call never produced a usable payload; retried on the next run
    TransportFailure {
        /// Invocation-level status, when the call got that far
        status: Option<u16>,
        reason: String,
    },
}

/// Outcome without its data, for counters and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    Blocked,
    PermanentFailure,
    TransportFailure,
}

impl CrawlOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success(_) => OutcomeKind::Success,
            Self::Blocked(_) => OutcomeKind::Blocked,
            Self::PermanentFailure(_) => OutcomeKind::PermanentFailure,
            Self::TransportFailure { .. } => OutcomeKind::TransportFailure,
        }
    }

    /// The status code surfaced in progress reports
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Success(_) => Some(STATUS_OK),
            Self::Blocked(code) | Self::PermanentFailure(code) => Some(*code),
            Self::TransportFailure { status, .. } => *status,
        }
    }
}

impl OutcomeKind {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Blocked => "blocked",
            Self::PermanentFailure => "permanent_failure",
            Self::TransportFailure => "transport_failure",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            CrawlOutcome::Success(Payload::new()).kind(),
            OutcomeKind::Success
        );
        assert_eq!(CrawlOutcome::Blocked(403).kind(), OutcomeKind::Blocked);
        assert_eq!(
            CrawlOutcome::PermanentFailure(404).kind(),
            OutcomeKind::PermanentFailure
        );
        assert_eq!(
            CrawlOutcome::TransportFailure {
                status: None,
                reason: "timeout".to_string()
            }
            .kind(),
            OutcomeKind::TransportFailure
        );
    }

    #[test]
    fn test_status_code() {
        assert_eq!(CrawlOutcome::Success(Payload::new()).status_code(), Some(200));
        assert_eq!(CrawlOutcome::Blocked(403).status_code(), Some(403));
        assert_eq!(CrawlOutcome::PermanentFailure(500).status_code(), Some(500));
        assert_eq!(
            CrawlOutcome::TransportFailure {
                status: Some(502),
                reason: "bad gateway".to_string()
            }
            .status_code(),
            Some(502)
        );
        assert_eq!(
            CrawlOutcome::TransportFailure {
                status: None,
                reason: "connection refused".to_string()
            }
            .status_code(),
            None
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", OutcomeKind::Blocked), "blocked");
        assert_eq!(
            format!("{}", OutcomeKind::TransportFailure),
            "transport_failure"
        );
    }
}
