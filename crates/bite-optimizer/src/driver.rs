//! Multi-attempt driver.

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use bite_types::{
    invalid_parameter, AttemptOutcome, AttemptSummary, BiteError, BiteResult, CoordinateMapper,
    OptimizeResult, SearchSpace,
};

use crate::cancel::CancelToken;
use crate::config::MinimizeConfig;
use crate::objective::Objective;
use crate::run::RunStatus;
use crate::search::{run_attempt, AttemptResult, Sampling};

/// Runs independent attempts and keeps the best.
///
/// ```
/// use bite_optimizer::{from_fn, MinimizeConfig, Minimizer, SearchSpace};
///
/// # fn main() -> Result<(), bite_optimizer::BiteError> {
/// let config = MinimizeConfig::new(500, 1, 3).with_seed(7);
/// let space = SearchSpace::new().add_dimension(-5.0, 5.0).add_dimension(-5.0, 5.0);
/// let sphere = from_fn(|x: &[f64]| x[0] * x[0] + x[1] * x[1]);
///
/// let minimizer = Minimizer::new(config);
/// let result = minimizer.run(&sphere, &space)?;
/// assert_eq!(result.attempts.len(), minimizer.config().attempts);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Minimizer {
    config: MinimizeConfig,
    cancel: Option<CancelToken>,
}

impl Minimizer {
    pub fn new(config: MinimizeConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &MinimizeConfig {
        &self.config
    }

    /// Run all attempts one after another on the calling thread. Once an
    /// attempt reaches the target value the remaining attempts are skipped.
    pub fn run<O>(&self, objective: &O, space: &SearchSpace) -> BiteResult<OptimizeResult>
    where
        O: Objective + ?Sized,
    {
        let (mapper, init) = self.prepare(space)?;
        let mut status = self.start(space);
        let started_at = Utc::now();

        let mut results = Vec::with_capacity(self.config.attempts);
        for attempt in 0..self.config.attempts {
            let result = run_attempt(
                attempt,
                &self.config,
                &mapper,
                &init,
                objective,
                self.cancel.as_ref(),
            );
            let result = match result {
                Ok(result) => result,
                Err(e) => return Err(fail(&mut status, e)),
            };

            let stop = result.outcome == AttemptOutcome::TargetReached;
            results.push(result);
            if stop {
                debug!(attempt, "target value reached, skipping remaining attempts");
                break;
            }
        }

        self.finish(&mapper, results, status, started_at)
    }

    /// Run attempts on the rayon pool. Every attempt draws from its own
    /// random stream, and outcomes are settled in attempt order, so the
    /// result or error equals that of [`Minimizer::run`]. Attempts after one
    /// that reaches the target still run, but their results and errors are
    /// discarded.
    pub fn run_parallel<O>(&self, objective: &O, space: &SearchSpace) -> BiteResult<OptimizeResult>
    where
        O: Objective + Sync + ?Sized,
    {
        let (mapper, init) = self.prepare(space)?;
        let mut status = self.start(space);
        let started_at = Utc::now();

        let outcomes: Vec<BiteResult<AttemptResult>> = (0..self.config.attempts)
            .into_par_iter()
            .map(|attempt| {
                run_attempt(
                    attempt,
                    &self.config,
                    &mapper,
                    &init,
                    objective,
                    self.cancel.as_ref(),
                )
            })
            .collect();

        let results = match settle_in_order(outcomes) {
            Ok(results) => results,
            Err(e) => return Err(fail(&mut status, e)),
        };

        self.finish(&mapper, results, status, started_at)
    }

    fn prepare(&self, space: &SearchSpace) -> BiteResult<(CoordinateMapper, Sampling)> {
        self.config.validate()?;
        let mapper = CoordinateMapper::new(space)?;

        let centre = self
            .config
            .initial_point
            .as_deref()
            .map(|point| mapper.to_internal(point))
            .transpose()?;

        Ok((
            mapper,
            Sampling {
                centre,
                radius: self.config.init_radius,
            },
        ))
    }

    fn start(&self, space: &SearchSpace) -> RunStatus {
        let mut status = RunStatus::new(self.config.attempts);
        status.mark_running();
        info!(
            run_id = %status.id,
            dims = space.dims(),
            iters = self.config.iters,
            depth = self.config.depth,
            attempts = self.config.attempts,
            "Starting minimization"
        );
        status
    }

    fn finish(
        &self,
        mapper: &CoordinateMapper,
        results: Vec<AttemptResult>,
        mut status: RunStatus,
        started_at: chrono::DateTime<Utc>,
    ) -> BiteResult<OptimizeResult> {
        let mut best: Option<&AttemptResult> = None;
        let mut attempts = Vec::with_capacity(results.len());

        for result in &results {
            let summary = AttemptSummary {
                attempt: result.attempt,
                best_value: result.best.value,
                evaluations: result.evaluations,
                outcome: result.outcome,
                duration_ms: result.duration_ms,
            };
            info!(
                run_id = %status.id,
                attempt = result.attempt,
                value = result.best.value,
                evaluations = result.evaluations,
                outcome = %result.outcome,
                "Attempt finished"
            );
            if status.record_attempt(&summary, result.best.cost) {
                best = Some(result);
            }
            attempts.push(summary);
        }

        let best = match best {
            Some(best) => best,
            None => {
                let err = invalid_parameter!("attempts", "no attempt finished");
                return Err(fail(&mut status, err));
            }
        };

        let x = mapper.to_real(&best.best.params)?;
        status.mark_completed();
        info!(
            run_id = %status.id,
            best_attempt = best.attempt,
            fun = best.best.value,
            evaluations = status.evaluations,
            "Minimization completed"
        );

        Ok(OptimizeResult {
            x,
            fun: best.best.value,
            nfev: self.config.nominal_evaluations(),
            evaluations: status.evaluations,
            best_attempt: best.attempt,
            attempts,
            run_id: status.id,
            started_at,
            finished_at: status.finished_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Replay attempt outcomes in index order: stop at the first error or after
/// the first attempt that reached the target.
fn settle_in_order(outcomes: Vec<BiteResult<AttemptResult>>) -> BiteResult<Vec<AttemptResult>> {
    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        let result = outcome?;
        let stop = result.outcome == AttemptOutcome::TargetReached;
        results.push(result);
        if stop {
            break;
        }
    }
    Ok(results)
}

fn fail(status: &mut RunStatus, error: BiteError) -> BiteError {
    warn!(run_id = %status.id, error = %error, "Minimization failed");
    status.mark_failed(error.to_string());
    error
}
