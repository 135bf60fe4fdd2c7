use std::fmt;

/// Lifecycle of one crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// Backlog and ledgers loaded, nothing invoked yet
    Idle,

    /// Walking the backlog
    Running,

    /// Backlog exhausted
    Completed,

    /// Stopped by an error or an interrupt
    Aborted,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted)
    }

    /// Returns true if the session may move from `self` to `next`
    pub fn can_transition_to(&self, next: SessionPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Idle, Self::Aborted)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Aborted)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds that trigger an identity reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetPolicy {
    pub max_requests_per_reset: u32,
    pub max_blocks_per_reset: u32,
}

impl Default for ResetPolicy {
    fn default() -> Self {
        Self {
            max_requests_per_reset: 1000,
            max_blocks_per_reset: 10,
        }
    }
}

/// Per-identity counters
///
/// The two counters are independent: a non-blocked answer does not clear
/// `blocks_since_reset`, and a block does not clear `requests_since_reset`.
/// Both go back to zero only when the identity is reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    pub requests_since_reset: u32,
    pub blocks_since_reset: u32,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a blocked answer; returns true when a reset is due
    pub fn record_block(&mut self, policy: &ResetPolicy) -> bool {
        self.blocks_since_reset += 1;
        self.blocks_since_reset >= policy.max_blocks_per_reset
    }

    /// Counts any non-blocked answer; returns true when a reset is due
    pub fn record_request(&mut self, policy: &ResetPolicy) -> bool {
        self.requests_since_reset += 1;
        self.requests_since_reset >= policy.max_requests_per_reset
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
