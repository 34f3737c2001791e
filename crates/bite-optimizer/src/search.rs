//! Single-attempt search.
//!
//! [`BiteSearch`] owns one population and advances it by one objective
//! evaluation per step. [`DeepSearch`] rotates between several of them,
//! pushing improvements from the active population into another one.
//! [`run_attempt`] drives a [`DeepSearch`] through the attempt state machine
//! until the budget, a convergence criterion or the target stops it.

use std::time::Instant;

use bite_types::{invalid_parameter, AttemptOutcome, BiteError, BiteResult, CoordinateMapper};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::MinimizeConfig;
use crate::objective::{Evaluator, Objective};
use crate::operators::{self, sel, Operator, OperatorInput};
use crate::population::{Candidate, Insertion, Population};
use crate::rng::AttemptRng;
use crate::selector::SelectorBank;

/// Gaussian probe radius adaptation: grow by e^0.2 on success, shrink by
/// e^-0.05 on failure, which balances at a 20% success rate.
const SIGMA_GROW: f64 = 1.221_402_758_160_170_3;
const SIGMA_SHRINK: f64 = 0.951_229_424_500_714;
const SIGMA_MIN: f64 = 1e-15;
const SIGMA_MAX: f64 = 0.5;

/// Lifecycle of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Init,
    Evolving,
    Converged,
    BudgetExhausted,
    TargetReached,
}

impl SearchState {
    pub fn outcome(self) -> Option<AttemptOutcome> {
        match self {
            Self::Init | Self::Evolving => None,
            Self::Converged => Some(AttemptOutcome::Converged),
            Self::BudgetExhausted => Some(AttemptOutcome::BudgetExhausted),
            Self::TargetReached => Some(AttemptOutcome::TargetReached),
        }
    }

    pub fn is_terminal(self) -> bool {
        self.outcome().is_some()
    }
}

/// How the initial population is sampled, in normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Sampling {
    /// Sampling centre; `None` means the middle of the unit cube.
    pub centre: Option<Vec<f64>>,
    /// Multiplier on the default standard deviation of 0.25.
    pub radius: f64,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            centre: None,
            radius: 1.0,
        }
    }
}

/// One population with its archive and adaptive state.
#[derive(Debug, Clone)]
pub struct BiteSearch {
    dims: usize,
    pop: Population,
    archive: Population,
    selectors: SelectorBank,
    sigma: f64,
    stall: usize,
    init: Sampling,
    trial: Vec<f64>,
}

impl BiteSearch {
    pub fn new(dims: usize, pop_size: usize, init: Sampling, rng: &mut AttemptRng) -> Self {
        let sigma = (0.25 * init.radius).min(SIGMA_MAX);
        Self {
            dims,
            pop: Population::new(dims, pop_size),
            archive: Population::new(dims, pop_size),
            selectors: SelectorBank::new(&sel::COUNTS, rng),
            sigma,
            stall: 0,
            init,
            trial: vec![0.0; dims],
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.pop.is_full()
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.pop.best()
    }

    pub fn population(&self) -> &Population {
        &self.pop
    }

    /// Perform one objective evaluation. While the population is still
    /// being filled this samples an initial point; afterwards it generates,
    /// evaluates and offers a trial point. Accepted trials ranked below the
    /// top two are also offered to `push`.
    ///
    /// Returns the stall count after the step.
    pub fn step<O>(
        &mut self,
        rng: &mut AttemptRng,
        evaluator: &mut Evaluator<'_, O>,
        push: Option<&mut BiteSearch>,
    ) -> BiteResult<usize>
    where
        O: Objective + ?Sized,
    {
        if !self.is_initialized() {
            self.init_step(rng, evaluator)?;
            return Ok(0);
        }

        let op = Operator::from_index(self.selectors.select(sel::OPERATOR, rng));
        let input = OperatorInput {
            pop: &self.pop,
            archive: &self.archive,
            sigma: self.sigma,
        };
        let applied = operators::generate(op, &input, &mut self.selectors, rng, &mut self.trial);

        for v in self.trial.iter_mut() {
            *v = operators::wrap(rng, *v);
        }

        let value = evaluator.evaluate(&self.trial)?;

        match self.pop.insert(Candidate::new(self.trial.clone(), value)) {
            Insertion::Rejected => {
                self.selectors.penalise_selected();
                self.stall += 1;

                if applied == Operator::GaussianProbe {
                    self.sigma = (self.sigma * SIGMA_SHRINK).max(SIGMA_MIN);
                }

                if self.pop.active_len() < self.pop.capacity()
                    && self.selectors.select(sel::GROW, rng) == 1
                {
                    self.pop.grow();
                }
            }
            Insertion::Accepted { rank, displaced } => {
                let active = self.pop.active_len();
                self.selectors
                    .reward_selected(1.0 - rank as f64 / active as f64);
                self.stall = 0;

                if applied == Operator::GaussianProbe {
                    self.sigma = (self.sigma * SIGMA_GROW).min(SIGMA_MAX);
                }

                if let Some(old) = displaced {
                    if rng.unit() < 1.0 / self.dims as f64 {
                        self.archive.insert(old);
                    }
                }

                // The top ranks stay private to each population.
                if let Some(target) = push {
                    if rank > 1 && target.is_initialized() {
                        target.pop.insert(self.pop.get(rank).clone());
                    }
                }

                if active > self.pop.capacity() / 2
                    && self.selectors.select(sel::SHRINK, rng) == 1
                {
                    self.pop.shrink();
                }
            }
        }

        Ok(self.stall)
    }

    fn init_step<O>(&mut self, rng: &mut AttemptRng, evaluator: &mut Evaluator<'_, O>) -> BiteResult<()>
    where
        O: Objective + ?Sized,
    {
        let sd = 0.25 * self.init.radius;
        let exact_start = self.pop.is_empty() && self.init.centre.is_some();

        for i in 0..self.dims {
            let centre = self.init.centre.as_ref().map_or(0.5, |c| c[i]);
            let v = if exact_start {
                centre
            } else {
                centre + sd * rng.gaussian()
            };
            self.trial[i] = operators::wrap(rng, v);
        }

        let value = evaluator.evaluate(&self.trial)?;
        self.pop.insert(Candidate::new(self.trial.clone(), value));
        Ok(())
    }
}

/// Several cooperating populations stepped in rotation.
///
/// The active population keeps stepping while it improves. On a failed
/// step, control passes to the current push target and a new push target is
/// drawn among the others. With a single population this is plain
/// [`BiteSearch`].
#[derive(Debug, Clone)]
pub struct DeepSearch {
    searches: Vec<BiteSearch>,
    current: usize,
    push: usize,
    stall: usize,
}

impl DeepSearch {
    pub fn new(
        depth: usize,
        dims: usize,
        pop_size: usize,
        init: &Sampling,
        rng: &mut AttemptRng,
    ) -> Self {
        let searches = (0..depth.max(1))
            .map(|_| BiteSearch::new(dims, pop_size, init.clone(), rng))
            .collect();

        let mut deep = Self {
            searches,
            current: 0,
            push: 0,
            stall: 0,
        };
        deep.push = deep.pick_push(rng);
        deep
    }

    fn pick_push(&self, rng: &mut AttemptRng) -> usize {
        let n = self.searches.len();
        if n == 1 {
            return 0;
        }
        let r = rng.index(n - 1);
        if r >= self.current {
            r + 1
        } else {
            r
        }
    }

    pub fn step<O>(&mut self, rng: &mut AttemptRng, evaluator: &mut Evaluator<'_, O>) -> BiteResult<usize>
    where
        O: Objective + ?Sized,
    {
        if self.searches.len() == 1 {
            self.stall = self.searches[0].step(rng, evaluator, None)?;
            return Ok(self.stall);
        }

        let (current, push) = pair_mut(&mut self.searches, self.current, self.push);
        let stall = current.step(rng, evaluator, Some(push))?;

        if stall == 0 {
            self.stall = 0;
        } else {
            self.stall += 1;
            self.current = self.push;
            self.push = self.pick_push(rng);
        }

        Ok(self.stall)
    }

    /// True once at least one population is completely evaluated.
    pub fn is_initialized(&self) -> bool {
        self.searches.iter().any(BiteSearch::is_initialized)
    }

    /// Best candidate across populations; earlier populations win ties.
    pub fn best(&self) -> Option<&Candidate> {
        self.searches
            .iter()
            .filter_map(BiteSearch::best)
            .fold(None, |best: Option<&Candidate>, c| match best {
                Some(b) if b.cost <= c.cost => Some(b),
                _ => Some(c),
            })
    }

    /// Largest spread over all populations, infinite until all are full.
    pub fn spread(&self) -> f64 {
        if !self.searches.iter().all(BiteSearch::is_initialized) {
            return f64::INFINITY;
        }
        self.searches
            .iter()
            .map(|s| s.population().spread())
            .fold(0.0, f64::max)
    }
}

fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b, "pair_mut needs distinct indices");
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Best point of one attempt, in normalized coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    pub attempt: usize,
    pub best: Candidate,
    /// Objective calls made by this attempt.
    pub evaluations: usize,
    pub outcome: AttemptOutcome,
    pub duration_ms: u64,
}

/// Run one attempt to a terminal state.
pub fn run_attempt<O>(
    attempt: usize,
    config: &MinimizeConfig,
    mapper: &CoordinateMapper,
    init: &Sampling,
    objective: &O,
    cancel: Option<&CancelToken>,
) -> BiteResult<AttemptResult>
where
    O: Objective + ?Sized,
{
    let started = Instant::now();
    let dims = mapper.dims();
    let pop_size = config
        .population_size
        .unwrap_or_else(|| Population::default_size(dims));
    let budget = config.attempt_budget();
    let stall_limit = config.stall_limit(dims);

    let mut rng = AttemptRng::new(config.seed, attempt);
    let mut evaluator = Evaluator::new(objective, mapper);
    let mut search = DeepSearch::new(config.depth, dims, pop_size, init, &mut rng);
    let mut state = SearchState::Init;

    while evaluator.evaluations() < budget {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(BiteError::Cancelled {
                evaluations: evaluator.evaluations(),
            });
        }

        let stall = search.step(&mut rng, &mut evaluator)?;

        if state == SearchState::Init && search.is_initialized() {
            state = SearchState::Evolving;
            debug!(
                attempt,
                evaluations = evaluator.evaluations(),
                "initial population evaluated"
            );
        }

        if let (Some(target), Some(best)) = (config.target_value, search.best()) {
            if best.cost <= target {
                state = SearchState::TargetReached;
                break;
            }
        }

        if state != SearchState::Evolving {
            continue;
        }

        if stall_limit.is_some_and(|limit| stall >= limit) {
            debug!(attempt, stall, "stall limit reached");
            state = SearchState::Converged;
            break;
        }

        if let Some(tolerance) = config.spread_tolerance {
            if evaluator.evaluations() % pop_size == 0 && search.spread() < tolerance {
                debug!(attempt, tolerance, "population collapsed");
                state = SearchState::Converged;
                break;
            }
        }
    }

    let outcome = state.outcome().unwrap_or(AttemptOutcome::BudgetExhausted);
    let best = search
        .best()
        .cloned()
        .ok_or_else(|| invalid_parameter!("iters", "budget of {} allows no evaluation", budget))?;

    debug!(
        attempt,
        %outcome,
        best = best.value,
        evaluations = evaluator.evaluations(),
        "attempt finished"
    );

    Ok(AttemptResult {
        attempt,
        best,
        evaluations: evaluator.evaluations(),
        outcome,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}
