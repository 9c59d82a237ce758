//! Scan cover solvers.
//!
//! Every solver runs synchronously on the caller's thread. Callers that want to
//! observe progress or stop a long solve from elsewhere inject a progress
//! handler and share a [`CancelToken`].

mod cancel;
mod greedy_next;
pub(crate) mod lower_bound;

pub use cancel::CancelToken;
pub use greedy_next::{solve, solve_with_fallible_progress, GreedyNext, ProgressHandler};
pub use lower_bound::max_first_contact;

use crate::scan_cover::ScanCover;

/// How a solve ended.
#[derive(Clone, Debug)]
pub enum SolveOutcome {
    /// Every serviceable edge was scheduled. The cover may be empty when the
    /// instance has no serviceable edges.
    Completed(ScanCover),
    /// The cancel token was observed; no partial result is kept.
    Cancelled,
}

impl SolveOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SolveOutcome::Cancelled)
    }

    pub fn scan_cover(&self) -> Option<&ScanCover> {
        match self {
            SolveOutcome::Completed(cover) => Some(cover),
            SolveOutcome::Cancelled => None,
        }
    }

    pub fn into_scan_cover(self) -> Option<ScanCover> {
        match self {
            SolveOutcome::Completed(cover) => Some(cover),
            SolveOutcome::Cancelled => None,
        }
    }
}

/// A scan cover algorithm.
pub trait Solver {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    fn solve(&mut self) -> SolveOutcome;
}
