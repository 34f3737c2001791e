//! Trial-point generators.
//!
//! All operators work in normalized space on a rank-ordered population
//! (index 0 is the best member). Output coordinates may leave `[0, 1]`;
//! callers pass them through [`wrap`] before evaluation.

use crate::population::Population;
use crate::rng::AttemptRng;
use crate::selector::SelectorBank;

/// Selector slots used by the search, in bank order.
pub mod sel {
    pub const OPERATOR: usize = 0;
    pub const DE_MODE: usize = 1;
    pub const MOVE_SPAN: usize = 2;
    pub const MOVE_ALL: usize = 3;
    pub const MIX_COUNT: usize = 4;
    pub const GROW: usize = 5;
    pub const SHRINK: usize = 6;

    /// Choice count of each selector.
    pub const COUNTS: [usize; 7] = [5, 2, 4, 2, 4, 2, 2];
}

const MOVE_SPANS: [f64; 4] = [0.5, 1.5, 2.0, 2.5];
const MIX_COUNTS: [usize; 4] = [2, 3, 4, 5];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// Best-biased base plus two averaged difference vectors.
    DifferentialStep,
    /// Base plus a difference against the archive of displaced members.
    ArchiveDifference,
    /// Heavy-tailed perturbation of one or all coordinates of a good member,
    /// then a random move around another good member.
    CoordinateMove,
    /// Rank-weighted mix of several good parents pushed away from the
    /// population centroid.
    CentroidRecombination,
    /// Gaussian sample around the best member with adaptive radius.
    GaussianProbe,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::DifferentialStep,
        Operator::ArchiveDifference,
        Operator::CoordinateMove,
        Operator::CentroidRecombination,
        Operator::GaussianProbe,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// Read-only state an operator draws from.
pub struct OperatorInput<'a> {
    pub pop: &'a Population,
    pub archive: &'a Population,
    pub sigma: f64,
}

/// Write a trial point for `op` into `out`. Returns the operator actually
/// applied, which differs from `op` when a fallback was needed.
pub fn generate(
    op: Operator,
    input: &OperatorInput<'_>,
    selectors: &mut SelectorBank,
    rng: &mut AttemptRng,
    out: &mut Vec<f64>,
) -> Operator {
    out.clear();
    out.resize(input.pop.dims(), 0.0);

    match op {
        Operator::DifferentialStep => differential_step(input.pop, selectors, rng, out),
        Operator::ArchiveDifference => {
            if input.archive.len() < 3 {
                differential_step(input.pop, selectors, rng, out);
                return Operator::DifferentialStep;
            }
            archive_difference(input.pop, input.archive, selectors, rng, out);
        }
        Operator::CoordinateMove => coordinate_move(input.pop, selectors, rng, out),
        Operator::CentroidRecombination => centroid_recombination(input.pop, selectors, rng, out),
        Operator::GaussianProbe => gaussian_probe(input.pop, input.sigma, rng, out),
    }

    op
}

/// Fold a coordinate back into `[0, 1]` by random reflection. Values far
/// outside are resampled uniformly.
pub fn wrap(rng: &mut AttemptRng, v: f64) -> f64 {
    if !v.is_finite() {
        return rng.unit();
    }
    if v < 0.0 {
        if v > -1.0 {
            return rng.unit() * -v;
        }
        return rng.unit();
    }
    if v > 1.0 {
        if v < 2.0 {
            return 1.0 - rng.unit() * (v - 1.0);
        }
        return rng.unit();
    }
    v
}

/// Rank in the best quarter, strongly skewed toward 0.
fn base_index(rng: &mut AttemptRng, n: usize) -> usize {
    rng.pow_index(3.0, (n / 4).max(1))
}

fn differential_step(
    pop: &Population,
    selectors: &mut SelectorBank,
    rng: &mut AttemptRng,
    out: &mut [f64],
) {
    let n = pop.active_len();
    let last = n - 1;

    let si1 = base_index(rng, n);
    let rp1 = pop.params(si1);
    let rp3 = pop.params(last - si1);
    let rp2 = pop.params(1 + rng.index(last));
    let si4 = rng.sqr_index(n);
    let rp4 = pop.params(si4);
    let rp5 = pop.params(last - si4);

    if selectors.select(sel::DE_MODE, rng) == 0 {
        for i in 0..out.len() {
            out[i] = rp1[i] + 0.5 * ((rp2[i] - rp3[i]) + (rp4[i] - rp5[i]));
        }
    } else {
        let rp1b = pop.params(rng.sqr_index(n));
        for i in 0..out.len() {
            out[i] = 0.5 * (rp1[i] + rp1b[i] + (rp2[i] - rp3[i]) + (rp4[i] - rp5[i]));
        }
    }
}

fn archive_difference(
    pop: &Population,
    archive: &Population,
    selectors: &mut SelectorBank,
    rng: &mut AttemptRng,
    out: &mut [f64],
) {
    let n = pop.active_len();
    let rp1 = pop.params(rng.sqr_index(n));
    let rp2 = pop.params(rng.index(n));
    let rp3 = archive.params(rng.index(archive.len()));

    let scale = if selectors.select(sel::DE_MODE, rng) == 0 {
        0.5
    } else {
        1.0
    };

    for i in 0..out.len() {
        out[i] = rp1[i] + scale * (rp2[i] - rp3[i]);
    }
}

fn coordinate_move(
    pop: &Population,
    selectors: &mut SelectorBank,
    rng: &mut AttemptRng,
    out: &mut [f64],
) {
    let n = pop.active_len();
    let dims = out.len();
    let dims_inv = 1.0 / dims as f64;

    out.copy_from_slice(pop.params(base_index(rng, n)));

    let (mut a, mut b) = if rng.unit() < 1.8 * dims_inv {
        (0, dims)
    } else {
        let a = rng.index(dims);
        (a, a + 1)
    };

    // Step sizes range from the whole interval down to ~2^-48.
    let r1 = rng.unit();
    let r12 = r1 * r1;
    let scale = 0.5f64.powf(r12 * r12 * 48.0);
    let rp1 = pop.params(((r1 * r12 * n as f64) as usize).min(n - 1));

    for i in a..b {
        out[i] = 0.5 * (out[i] + rp1[i]) + 0.5 * scale * rng.tpdf();
    }

    if rng.unit() < 1.0 - dims_inv {
        let rp2 = pop.params(rng.sqr_index(n));

        if rng.unit() < dims_inv.sqrt() && selectors.select(sel::MOVE_ALL, rng) == 1 {
            a = 0;
            b = dims;
        }

        let span = MOVE_SPANS[selectors.select(sel::MOVE_SPAN, rng)];
        let m1 = rng.tpdf() * span;
        let m2 = rng.tpdf() * span;

        for i in a..b {
            out[i] += (rp2[i] - out[i]) * m1;
            out[i] += (rp2[i] - out[i]) * m2;
        }
    }
}

fn centroid_recombination(
    pop: &Population,
    selectors: &mut SelectorBank,
    rng: &mut AttemptRng,
    out: &mut [f64],
) {
    let n = pop.active_len();
    let count = MIX_COUNTS[selectors.select(sel::MIX_COUNT, rng)].min(n);

    let mut weight_sum = 0.0;
    for _ in 0..count {
        let rank = rng.sqr_index(n);
        let w = 1.0 / (1.0 + rank as f64);
        for (o, &p) in out.iter_mut().zip(pop.params(rank)) {
            *o += w * p;
        }
        weight_sum += w;
    }
    for o in out.iter_mut() {
        *o /= weight_sum;
    }

    let centroid = pop.centroid();
    let push = 0.5 * rng.unit();
    let pa = pop.params(rng.index(n));
    let pb = pop.params(rng.index(n));
    let jitter = 0.5 * rng.tpdf();

    for i in 0..out.len() {
        out[i] += (out[i] - centroid[i]) * push + (pa[i] - pb[i]) * jitter;
    }
}

fn gaussian_probe(pop: &Population, sigma: f64, rng: &mut AttemptRng, out: &mut [f64]) {
    let best = pop.params(0);
    for (o, &b) in out.iter_mut().zip(best) {
        *o = b + sigma * rng.gaussian();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::Candidate;

    fn ring_population(dims: usize, size: usize, rng: &mut AttemptRng) -> Population {
        let mut pop = Population::new(dims, size);
        for _ in 0..size {
            let params: Vec<f64> = (0..dims).map(|_| rng.unit()).collect();
            let value: f64 = params.iter().map(|p| (p - 0.3) * (p - 0.3)).sum();
            pop.insert(Candidate::new(params, value));
        }
        pop
    }

    #[test]
    fn wrap_keeps_unit_interval() {
        let mut rng = AttemptRng::new(3, 0);
        for &v in &[-5.0, -0.5, 0.0, 0.25, 1.0, 1.5, 7.0, f64::NAN, f64::INFINITY] {
            let w = wrap(&mut rng, v);
            assert!((0.0..=1.0).contains(&w), "{v} wrapped to {w}");
        }
        assert_eq!(wrap(&mut rng, 0.25), 0.25);
    }

    #[test]
    fn every_operator_produces_finite_points() {
        let mut rng = AttemptRng::new(4, 0);
        let pop = ring_population(3, 16, &mut rng);
        let archive = ring_population(3, 8, &mut rng);
        let mut selectors = SelectorBank::new(&sel::COUNTS, &mut rng);
        let input = OperatorInput {
            pop: &pop,
            archive: &archive,
            sigma: 0.1,
        };

        let mut out = Vec::new();
        for op in Operator::ALL {
            for _ in 0..50 {
                let applied = generate(op, &input, &mut selectors, &mut rng, &mut out);
                assert_eq!(applied, op);
                assert_eq!(out.len(), 3);
                assert!(out.iter().all(|v| v.is_finite()), "{op:?} gave {out:?}");
                selectors.penalise_selected();
            }
        }
    }

    #[test]
    fn archive_difference_falls_back_without_archive() {
        let mut rng = AttemptRng::new(5, 0);
        let pop = ring_population(2, 10, &mut rng);
        let archive = Population::new(2, 10);
        let mut selectors = SelectorBank::new(&sel::COUNTS, &mut rng);
        let input = OperatorInput {
            pop: &pop,
            archive: &archive,
            sigma: 0.1,
        };

        let mut out = Vec::new();
        let applied = generate(
            Operator::ArchiveDifference,
            &input,
            &mut selectors,
            &mut rng,
            &mut out,
        );
        assert_eq!(applied, Operator::DifferentialStep);
    }

    #[test]
    fn gaussian_probe_centres_on_best() {
        let mut rng = AttemptRng::new(6, 0);
        let pop = ring_population(2, 10, &mut rng);
        let archive = Population::new(2, 10);
        let mut selectors = SelectorBank::new(&sel::COUNTS, &mut rng);
        let input = OperatorInput {
            pop: &pop,
            archive: &archive,
            sigma: 1e-9,
        };

        let mut out = Vec::new();
        generate(Operator::GaussianProbe, &input, &mut selectors, &mut rng, &mut out);
        for (o, b) in out.iter().zip(pop.params(0)) {
            assert!((o - b).abs() < 1e-6);
        }
    }

    #[test]
    fn single_dimension_is_supported() {
        let mut rng = AttemptRng::new(8, 0);
        let pop = ring_population(1, 13, &mut rng);
        let archive = ring_population(1, 5, &mut rng);
        let mut selectors = SelectorBank::new(&sel::COUNTS, &mut rng);
        let input = OperatorInput {
            pop: &pop,
            archive: &archive,
            sigma: 0.2,
        };

        let mut out = Vec::new();
        for op in Operator::ALL {
            generate(op, &input, &mut selectors, &mut rng, &mut out);
            assert_eq!(out.len(), 1);
        }
    }
}
