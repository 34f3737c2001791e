//! Run configuration.

use bite_types::{invalid_parameter, BiteError, BiteResult};
use serde::{Deserialize, Serialize};

/// Depth values at or above this limit are rejected.
pub const MAX_DEPTH: usize = 36;

/// Top-level configuration for a minimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizeConfig {
    /// Objective evaluations allowed in one attempt, before depth scaling.
    pub iters: usize,

    /// Number of cooperating sub-populations per attempt. Multiplies the
    /// per-attempt budget by `sqrt(depth)`.
    pub depth: usize,

    /// Number of independent attempts.
    pub attempts: usize,

    /// Base seed; attempt `k` runs on stream `k` of this seed.
    pub seed: u64,

    /// Stall-based convergence: stop an attempt after
    /// `128 * dims * stall_factor` consecutive non-improving evaluations.
    /// `0` disables the check.
    pub stall_factor: usize,

    /// Stop an attempt when the population spread in normalized space falls
    /// below this value.
    pub spread_tolerance: Option<f64>,

    /// Stop the whole run once an objective value at or below this is found.
    pub target_value: Option<f64>,

    /// Starting point in caller coordinates; the initial population is
    /// sampled around it.
    pub initial_point: Option<Vec<f64>>,

    /// Initial sampling radius, relative to the default spread.
    pub init_radius: f64,

    /// Population size per sub-population. `None` picks a size from the
    /// dimensionality.
    pub population_size: Option<usize>,
}

impl Default for MinimizeConfig {
    fn default() -> Self {
        Self {
            iters: 1000,
            depth: 1,
            attempts: 10,
            seed: 1,
            stall_factor: 1,
            spread_tolerance: Some(1e-12),
            target_value: None,
            initial_point: None,
            init_radius: 1.0,
            population_size: None,
        }
    }
}

impl MinimizeConfig {
    pub fn new(iters: usize, depth: usize, attempts: usize) -> Self {
        Self {
            iters,
            depth,
            attempts,
            ..Self::default()
        }
    }

    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> BiteResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_stall_factor(mut self, factor: usize) -> Self {
        self.stall_factor = factor;
        self
    }

    pub fn with_spread_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.spread_tolerance = tolerance;
        self
    }

    pub fn with_target_value(mut self, target: f64) -> Self {
        self.target_value = Some(target);
        self
    }

    pub fn with_initial_point(mut self, point: Vec<f64>, radius: f64) -> Self {
        self.initial_point = Some(point);
        self.init_radius = radius;
        self
    }

    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    pub fn validate(&self) -> BiteResult<()> {
        if self.iters < 1 {
            return Err(invalid_parameter!("iters", "must be at least 1, got {}", self.iters));
        }
        if self.depth < 1 || self.depth >= MAX_DEPTH {
            return Err(invalid_parameter!(
                "depth",
                "must be in [1, {}), got {}",
                MAX_DEPTH,
                self.depth
            ));
        }
        if self.attempts < 1 {
            return Err(invalid_parameter!(
                "attempts",
                "must be at least 1, got {}",
                self.attempts
            ));
        }
        if !(self.init_radius.is_finite() && self.init_radius > 0.0) {
            return Err(invalid_parameter!(
                "init_radius",
                "must be positive and finite, got {}",
                self.init_radius
            ));
        }
        if let Some(tol) = self.spread_tolerance {
            if !(tol >= 0.0) {
                return Err(invalid_parameter!(
                    "spread_tolerance",
                    "must be non-negative, got {}",
                    tol
                ));
            }
        }
        if let Some(size) = self.population_size {
            if size < 4 {
                return Err(invalid_parameter!(
                    "population_size",
                    "must be at least 4, got {}",
                    size
                ));
            }
        }
        Ok(())
    }

    /// Evaluation budget of a single attempt.
    pub fn attempt_budget(&self) -> usize {
        (self.iters as f64 * (self.depth as f64).sqrt()) as usize
    }

    /// Nominal evaluation count reported as `nfev`.
    pub fn nominal_evaluations(&self) -> usize {
        (self.iters as f64 * (self.depth as f64).sqrt() * self.attempts as f64) as usize
    }

    /// Consecutive non-improving evaluations that end an attempt, if enabled.
    pub fn stall_limit(&self, dims: usize) -> Option<usize> {
        (self.stall_factor > 0).then(|| 128 * dims * self.stall_factor)
    }
}

impl TryFrom<&str> for MinimizeConfig {
    type Error = BiteError;

    fn try_from(json: &str) -> BiteResult<Self> {
        Self::from_json(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_wrapper() {
        let config = MinimizeConfig::default();
        assert_eq!(config.iters, 1000);
        assert_eq!(config.depth, 1);
        assert_eq!(config.attempts, 10);
        assert!(config.validate().is_ok());
        assert_eq!(config.nominal_evaluations(), 10_000);
    }

    #[test]
    fn budget_scales_with_sqrt_depth() {
        let config = MinimizeConfig::new(1000, 4, 3);
        assert_eq!(config.attempt_budget(), 2000);
        assert_eq!(config.nominal_evaluations(), 6000);

        let config = MinimizeConfig::new(1000, 2, 10);
        assert_eq!(config.attempt_budget(), 1414);
        assert_eq!(config.nominal_evaluations(), 14142);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        for config in [
            MinimizeConfig::new(0, 1, 1),
            MinimizeConfig::new(10, 0, 1),
            MinimizeConfig::new(10, 36, 1),
            MinimizeConfig::new(10, 40, 1),
            MinimizeConfig::new(10, 1, 0),
        ] {
            assert!(matches!(
                config.validate(),
                Err(BiteError::InvalidParameter { .. })
            ));
        }

        assert!(MinimizeConfig::new(10, 35, 1).validate().is_ok());
    }

    #[test]
    fn invalid_optional_knobs_are_rejected() {
        let bad_radius = MinimizeConfig::default().with_initial_point(vec![0.0], 0.0);
        assert!(bad_radius.validate().is_err());

        let bad_tol = MinimizeConfig::default().with_spread_tolerance(Some(f64::NAN));
        assert!(bad_tol.validate().is_err());

        let tiny_pop = MinimizeConfig::default().with_population_size(2);
        assert!(tiny_pop.validate().is_err());
    }

    #[test]
    fn stall_limit() {
        let config = MinimizeConfig::default();
        assert_eq!(config.stall_limit(3), Some(384));
        assert_eq!(config.with_stall_factor(0).stall_limit(3), None);
    }

    #[test]
    fn loads_partial_json() {
        let config = MinimizeConfig::from_json(r#"{"iters": 500, "attempts": 3, "seed": 42}"#).unwrap();
        assert_eq!(config.iters, 500);
        assert_eq!(config.attempts, 3);
        assert_eq!(config.seed, 42);
        assert_eq!(config.depth, 1);
    }

    #[test]
    fn json_is_validated() {
        assert!(matches!(
            MinimizeConfig::from_json(r#"{"depth": 40}"#),
            Err(BiteError::InvalidParameter { .. })
        ));
        assert!(matches!(
            MinimizeConfig::try_from("{"),
            Err(BiteError::Serialization(_))
        ));
    }
}
