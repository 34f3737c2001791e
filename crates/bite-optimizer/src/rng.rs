//! Seeded random source for one attempt.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

/// Random source with the biased draws the search operators need.
///
/// Every attempt gets its own ChaCha stream, so attempts are uncorrelated and
/// a run is reproducible regardless of how attempts are scheduled.
#[derive(Debug, Clone)]
pub struct AttemptRng {
    inner: ChaCha8Rng,
}

impl AttemptRng {
    pub fn new(seed: u64, attempt: usize) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(seed);
        inner.set_stream(attempt as u64);
        Self { inner }
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform integer in `[0, n)`. `n` must be positive.
    pub fn index(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }

    /// Uniform in `[0, 1)` raised to `p`; `p > 1` skews toward 0.
    pub fn pow(&mut self, p: f64) -> f64 {
        self.unit().powf(p)
    }

    /// Integer in `[0, n)` skewed toward 0 by power `p`.
    pub fn pow_index(&mut self, p: f64, n: usize) -> usize {
        ((self.pow(p) * n as f64) as usize).min(n.saturating_sub(1))
    }

    /// Integer in `[0, n)` with squared skew toward 0.
    pub fn sqr_index(&mut self, n: usize) -> usize {
        self.pow_index(2.0, n)
    }

    /// Triangular distribution on `(-1, 1)`, peak at 0.
    pub fn tpdf(&mut self) -> f64 {
        self.unit() - self.unit()
    }

    pub fn gaussian(&mut self) -> f64 {
        self.inner.sample(StandardNormal)
    }
}
