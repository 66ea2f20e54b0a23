//! Wall-clock budget for a run.

use solera_traits::BudgetStatus;
use std::time::{Duration, Instant};

/// Tracks elapsed time against an optional limit.
///
/// The loop only consults the budget between steps, so a single slow
/// prediction can overrun it; the next step is then never started.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    limit: Option<Duration>,
}

impl TimeBudget {
    /// Starts the clock now.
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    /// A budget that never runs out.
    pub fn unlimited() -> Self {
        Self::start(None)
    }

    /// The configured limit.
    pub const fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Time left, saturating at zero. `None` when unlimited.
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|l| l.saturating_sub(self.elapsed()))
    }

    /// Whether the limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.limit.is_some_and(|l| self.elapsed() >= l)
    }

    /// Snapshot handed to the predictor.
    pub fn status(&self) -> BudgetStatus {
        let elapsed = self.elapsed();
        BudgetStatus {
            elapsed,
            remaining: self.limit.map(|l| l.saturating_sub(elapsed)),
        }
    }
}
