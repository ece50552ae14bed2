/// Entry state definitions for tracking identifiers in the frontier
///
/// Every identifier the frontier has ever accepted is in exactly one of
/// these states.
use std::fmt;

/// Represents the current state of an identifier in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    // ===== Active States =====
    /// Accepted and waiting to be dispatched to a worker
    Enqueued,

    /// Dispatched to a worker; the fetch has not completed yet
    InFlight,

    // ===== Terminal States =====
    /// Fetched and recorded
    Done,

    /// Fetch or extraction failed; no record was written
    Failed,
}

impl EntryState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the entry still counts against exhaustion
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Enqueued | Self::InFlight)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enqueued => "enqueued",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
