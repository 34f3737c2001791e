//! Run tracking across attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bite_types::AttemptSummary;

/// Unique minimization run identifier.
pub type RunId = Uuid;

/// Lifecycle state for a minimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Best value seen so far and the attempt that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestAttempt {
    pub attempt: usize,
    pub value: f64,
    /// Ordering key; non-finite values count as `+inf`.
    pub cost: f64,
}

/// Aggregate status of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub id: RunId,
    pub state: RunState,
    pub attempts_total: usize,
    pub attempts_completed: usize,
    pub evaluations: usize,
    pub best: Option<BestAttempt>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl RunStatus {
    pub fn new(attempts_total: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: RunState::Pending,
            attempts_total,
            attempts_completed: 0,
            evaluations: 0,
            best: None,
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn mark_running(&mut self) {
        self.state = RunState::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = RunState::Completed;
        self.finished_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: String) {
        self.state = RunState::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Fold a finished attempt into the totals. The best is replaced only on
    /// a strictly lower cost, so recording attempts in index order keeps the
    /// earliest of equal results.
    pub fn record_attempt(&mut self, summary: &AttemptSummary, cost: f64) -> bool {
        self.attempts_completed += 1;
        self.evaluations += summary.evaluations;

        let improved = match &self.best {
            None => true,
            Some(best) => cost < best.cost,
        };
        if improved {
            self.best = Some(BestAttempt {
                attempt: summary.attempt,
                value: summary.best_value,
                cost,
            });
        }
        improved
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, RunState::Completed | RunState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bite_types::AttemptOutcome;

    fn summary(attempt: usize, value: f64) -> AttemptSummary {
        AttemptSummary {
            attempt,
            best_value: value,
            evaluations: 100,
            outcome: AttemptOutcome::BudgetExhausted,
            duration_ms: 1,
        }
    }

    #[test]
    fn run_status_lifecycle() {
        let mut status = RunStatus::new(3);
        assert_eq!(status.state, RunState::Pending);
        assert!(status.started_at.is_none());

        status.mark_running();
        assert_eq!(status.state, RunState::Running);
        assert!(status.started_at.is_some());
        assert!(!status.is_finished());

        status.mark_completed();
        assert_eq!(status.state, RunState::Completed);
        assert!(status.finished_at.is_some());
        assert!(status.is_finished());
    }

    #[test]
    fn failure_keeps_message() {
        let mut status = RunStatus::new(1);
        status.mark_running();
        status.mark_failed("objective failed".into());
        assert_eq!(status.state, RunState::Failed);
        assert_eq!(status.error.as_deref(), Some("objective failed"));
    }

    #[test]
    fn best_attempt_tracking() {
        let mut status = RunStatus::new(4);

        assert!(status.record_attempt(&summary(0, 2.0), 2.0));
        assert!(status.record_attempt(&summary(1, 0.5), 0.5));
        assert!(!status.record_attempt(&summary(2, 0.5), 0.5), "ties keep the earlier attempt");
        assert!(!status.record_attempt(&summary(3, f64::NAN), f64::INFINITY));

        let best = status.best.unwrap();
        assert_eq!(best.attempt, 1);
        assert_eq!(best.value, 0.5);
        assert_eq!(status.attempts_completed, 4);
        assert_eq!(status.evaluations, 400);
    }

    #[test]
    fn serializes_to_json() {
        let mut status = RunStatus::new(2);
        status.record_attempt(&summary(0, 1.25), 1.25);
        let json = serde_json::to_string(&status).unwrap();
        let back: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
