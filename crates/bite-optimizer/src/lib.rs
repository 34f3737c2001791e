//! # bite-optimizer
//!
//! Bounded, derivative-free global minimization with multi-attempt restarts.
//!
//! Each attempt evolves a small rank-ordered population in normalized
//! coordinates with a mix of differential, archive, coordinate, centroid and
//! Gaussian trial generators, chosen by self-adapting selectors. Attempts run
//! on independent random streams, sequentially or on the rayon pool, and the
//! best result over all attempts is returned.
//!
//! ```
//! use bite_optimizer::minimize;
//!
//! # fn main() -> Result<(), bite_optimizer::BiteError> {
//! let result = minimize(
//!     |x: &[f64]| -> Result<f64, String> { Ok(x[0] * x[0] + (x[1] - 1.0).powi(2)) },
//!     &[(-5.0, 5.0), (-5.0, 5.0)],
//!     300,
//!     1,
//!     2,
//! )?;
//! assert_eq!(result.nfev, 600);
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

mod cancel;
mod config;
mod driver;
mod objective;
mod operators;
mod population;
mod rng;
mod run;
mod search;
mod selector;

pub use cancel::CancelToken;
pub use config::{MinimizeConfig, MAX_DEPTH};
pub use driver::Minimizer;
pub use objective::{from_fn, Evaluator, FnObjective, Objective};
pub use operators::Operator;
pub use population::{rank_cost, Candidate, Insertion, Population};
pub use rng::AttemptRng;
pub use run::{BestAttempt, RunId, RunState, RunStatus};
pub use search::{run_attempt, AttemptResult, BiteSearch, DeepSearch, Sampling, SearchState};
pub use selector::{Selector, SelectorBank};

pub use bite_types::{
    AttemptOutcome, AttemptSummary, BiteError, BiteResult, Bound, CoordinateMapper,
    ObjectiveError, OptimizeResult, SearchSpace,
};

/// Minimize `objective` over the box `bounds` with the default knobs.
///
/// Runs `attempts` sequential attempts of `floor(iters * sqrt(depth))`
/// evaluations each and returns the best point found. Use [`Minimizer`] with
/// a [`MinimizeConfig`] for seeding, stopping criteria, an initial point or
/// parallel attempts.
pub fn minimize<O>(
    objective: O,
    bounds: &[(f64, f64)],
    iters: usize,
    depth: usize,
    attempts: usize,
) -> BiteResult<OptimizeResult>
where
    O: Objective,
{
    let space = SearchSpace::from_bounds(bounds);
    Minimizer::new(MinimizeConfig::new(iters, depth, attempts)).run(&objective, &space)
}
