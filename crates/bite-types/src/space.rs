//! Search space definitions.

use serde::{Deserialize, Serialize};

use crate::errors::BiteResult;
use crate::invalid_bounds;

/// Lower and upper bound of a single dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Width of the interval.
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    fn is_valid(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite() && self.lower < self.upper
    }
}

impl From<(f64, f64)> for Bound {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self::new(lower, upper)
    }
}

/// The full search space: an ordered list of per-dimension bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub bounds: Vec<Bound>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self { bounds: Vec::new() }
    }

    /// Build a space from `(lower, upper)` pairs.
    pub fn from_bounds(bounds: &[(f64, f64)]) -> Self {
        Self {
            bounds: bounds.iter().copied().map(Bound::from).collect(),
        }
    }

    pub fn add_dimension(mut self, lower: f64, upper: f64) -> Self {
        self.bounds.push(Bound::new(lower, upper));
        self
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    pub fn lower(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.lower).collect()
    }

    pub fn upper(&self) -> Vec<f64> {
        self.bounds.iter().map(|b| b.upper).collect()
    }

    /// Whether every coordinate of `point` lies within its bound.
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.dims()
            && self
                .bounds
                .iter()
                .zip(point)
                .all(|(bound, &value)| bound.contains(value))
    }

    /// Check that the space is non-empty and every interval is finite and
    /// non-degenerate.
    pub fn validate(&self) -> BiteResult<()> {
        if self.bounds.is_empty() {
            return Err(invalid_bounds!("search space has no dimensions"));
        }

        for (i, bound) in self.bounds.iter().enumerate() {
            if !bound.is_valid() {
                return Err(invalid_bounds!(
                    "dimension {} has lower {} and upper {}; lower must be finite and strictly below a finite upper",
                    i,
                    bound.lower,
                    bound.upper
                ));
            }
        }

        Ok(())
    }
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[(f64, f64)]> for SearchSpace {
    fn from(bounds: &[(f64, f64)]) -> Self {
        Self::from_bounds(bounds)
    }
}
