//! Core types shared across the crate

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a source unit
///
/// A unit starts `Enabled` or `Disabled` per configuration, moves to `Running`
/// only when the orchestrator dispatches it, and reaches `Complete` exactly
/// once, whether its fetch succeeded, failed, or timed out. A unit never
/// leaves `Complete`, and a `Disabled` unit is never dispatched at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    /// Excluded from the run by configuration
    Disabled,
    /// Ready to be dispatched
    Enabled,
    /// Fetch currently in flight
    Running,
    /// Finished, successfully or not
    Complete,
}

/// Category of an absorbed per-source failure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The fetch exceeded the per-source deadline
    Timeout,
    /// Any other error raised inside the fetch
    Other,
}

/// Outcome of one source unit's wrapped execution
///
/// Failures are absorbed inside the lifecycle wrapper, so the orchestrator's
/// aggregation step only ever distinguishes these two shapes; it never sees a
/// raw error from a source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Fetch returned normally with an ordered list of coupon links
    /// (possibly empty)
    Links(Vec<String>),
    /// Fetch failed; the failure was logged and absorbed
    Failed(FailureKind),
}

impl UnitOutcome {
    /// The failure category, if this outcome is a failure
    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            UnitOutcome::Links(_) => None,
            UnitOutcome::Failed(kind) => Some(*kind),
        }
    }

    /// Consume the outcome, yielding its links (empty for failures)
    pub fn into_links(self) -> Vec<String> {
        match self {
            UnitOutcome::Links(links) => links,
            UnitOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Summary of one scrape run
///
/// Created fresh per run, logged as a single structured line, and kept on the
/// orchestrator for inspection. Not persisted anywhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Number of source units dispatched
    pub attempted: usize,
    /// Units that returned a link list (possibly empty)
    pub succeeded: usize,
    /// Units that failed for a reason other than the deadline
    pub failed: usize,
    /// Units that exceeded the per-source deadline
    pub timed_out: usize,
    /// Total links in the aggregate result
    pub links: usize,
    /// Wall-clock time from first dispatch to last outcome collected
    #[serde(skip)]
    pub duration: Duration,
}

impl RunMetrics {
    /// Record one unit outcome into the counters
    pub(crate) fn record(&mut self, outcome: &UnitOutcome) {
        self.attempted += 1;
        match outcome.failure() {
            None => self.succeeded += 1,
            Some(FailureKind::Timeout) => self.timed_out += 1,
            Some(FailureKind::Other) => self.failed += 1,
        }
    }
}
