use crate::stats::Stats;
use std::time::{Duration, Instant};

/// Stop conditions of a search run, polled at node boundaries.
///
/// Reaching a limit is not an error: the search unwinds in an orderly way
/// and reports its best-known result with unknown completeness.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    /// Wall-clock budget of one search run.
    pub time: Option<Duration>,
    /// Maximum number of decisions.
    pub decisions: Option<u64>,
    /// Stop after this many solutions.
    pub solutions: Option<u64>,
}

impl Limits {
    pub fn none() -> Limits {
        Limits::default()
    }

    pub fn with_time(mut self, budget: Duration) -> Limits {
        self.time = Some(budget);
        self
    }

    pub fn with_decisions(mut self, budget: u64) -> Limits {
        self.decisions = Some(budget);
        self
    }

    pub fn with_solutions(mut self, budget: u64) -> Limits {
        self.solutions = Some(budget);
        self
    }

    pub fn exhausted(&self, stats: &Stats, started: Instant) -> bool {
        if let Some(budget) = self.time {
            if started.elapsed() >= budget {
                return true;
            }
        }
        if let Some(budget) = self.decisions {
            if stats.num_decisions >= budget {
                return true;
            }
        }
        if let Some(budget) = self.solutions {
            if stats.num_solutions >= budget {
                return true;
            }
        }
        false
    }
}
