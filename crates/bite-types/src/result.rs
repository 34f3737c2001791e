//! Result records returned by the minimizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a single attempt terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The stall or spread criterion fired before the budget ran out.
    Converged,
    /// The per-attempt evaluation budget was used up.
    BudgetExhausted,
    /// The configured target value was reached.
    TargetReached,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Converged => "converged",
            Self::BudgetExhausted => "budget_exhausted",
            Self::TargetReached => "target_reached",
        };
        f.write_str(name)
    }
}

/// Diagnostics for one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptSummary {
    /// Attempt index (0-based), also the RNG stream it ran on.
    pub attempt: usize,
    pub best_value: f64,
    /// Objective calls actually made by this attempt.
    pub evaluations: usize,
    pub outcome: AttemptOutcome,
    pub duration_ms: u64,
}

/// Immutable result of a full multi-attempt run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    /// Best point found, in caller coordinates.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub fun: f64,
    /// Nominal evaluation count: `floor(iters * sqrt(depth) * attempts)`.
    ///
    /// This is the budget, not a live tally; early exits are not subtracted.
    /// See [`OptimizeResult::evaluations`] for the actual number of calls.
    pub nfev: usize,
    /// Objective calls actually made across all attempts.
    pub evaluations: usize,
    /// Index of the attempt that produced `x`.
    pub best_attempt: usize,
    pub attempts: Vec<AttemptSummary>,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OptimizeResult {
    fn count_outcome(&self, outcome: AttemptOutcome) -> usize {
        self.attempts.iter().filter(|a| a.outcome == outcome).count()
    }

    pub fn converged_attempts(&self) -> usize {
        self.count_outcome(AttemptOutcome::Converged)
    }

    pub fn exhausted_attempts(&self) -> usize {
        self.count_outcome(AttemptOutcome::BudgetExhausted)
    }

    pub fn target_reached(&self) -> bool {
        self.count_outcome(AttemptOutcome::TargetReached) > 0
    }

    /// Wall-clock duration of the run.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl std::fmt::Display for OptimizeResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "   x: {:?}", self.x)?;
        writeln!(f, " fun: {}", self.fun)?;
        write!(f, "nfev: {}", self.nfev)
    }
}
