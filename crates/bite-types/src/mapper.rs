//! Affine mapping between caller coordinates and the normalized `[0, 1]^D`
//! space the search works in.

use crate::errors::BiteResult;
use crate::invalid_bounds;
use crate::space::SearchSpace;

/// Per-dimension affine transform `real = lower + span * norm`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapper {
    lower: Vec<f64>,
    span: Vec<f64>,
}

impl CoordinateMapper {
    /// Build a mapper, validating the space first.
    pub fn new(space: &SearchSpace) -> BiteResult<Self> {
        space.validate()?;

        Ok(Self {
            lower: space.lower(),
            span: space.bounds.iter().map(|b| b.span()).collect(),
        })
    }

    pub fn dims(&self) -> usize {
        self.lower.len()
    }

    /// Map a caller point into normalized coordinates.
    pub fn to_internal(&self, real: &[f64]) -> BiteResult<Vec<f64>> {
        self.check_len(real.len())?;

        Ok(real
            .iter()
            .zip(self.lower.iter().zip(&self.span))
            .map(|(&x, (&lo, &span))| (x - lo) / span)
            .collect())
    }

    /// Map a normalized point back to caller coordinates.
    pub fn to_real(&self, norm: &[f64]) -> BiteResult<Vec<f64>> {
        let mut out = vec![0.0; self.dims()];
        self.to_real_into(norm, &mut out)?;
        Ok(out)
    }

    /// Allocation-free variant of [`CoordinateMapper::to_real`].
    pub fn to_real_into(&self, norm: &[f64], out: &mut [f64]) -> BiteResult<()> {
        self.check_len(norm.len())?;
        self.check_len(out.len())?;

        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.lower[i] + self.span[i] * norm[i];
        }

        Ok(())
    }

    /// A point of the wrong length does not belong to this search space.
    fn check_len(&self, actual: usize) -> BiteResult<()> {
        if actual != self.dims() {
            return Err(invalid_bounds!(
                "point has {} coordinates, search space has {}",
                actual,
                self.dims()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BiteError;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn maps_corners_and_centre() {
        let space = SearchSpace::from_bounds(&[(-5.0, 5.0), (10.0, 30.0)]);
        let mapper = CoordinateMapper::new(&space).unwrap();

        assert_eq!(mapper.to_real(&[0.0, 0.0]).unwrap(), vec![-5.0, 10.0]);
        assert_eq!(mapper.to_real(&[1.0, 1.0]).unwrap(), vec![5.0, 30.0]);

        let centre = mapper.to_internal(&[0.0, 20.0]).unwrap();
        assert_relative_eq!(centre[0], 0.5);
        assert_relative_eq!(centre[1], 0.5);
    }

    #[test]
    fn invalid_space_fails_construction() {
        let space = SearchSpace::from_bounds(&[(1.0, 1.0)]);
        assert!(matches!(
            CoordinateMapper::new(&space),
            Err(BiteError::InvalidBounds { .. })
        ));
    }

    #[test]
    fn wrong_length_point_is_rejected() {
        let space = SearchSpace::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]);
        let mapper = CoordinateMapper::new(&space).unwrap();

        match mapper.to_internal(&[0.5]) {
            Err(BiteError::InvalidBounds { message }) => {
                assert!(message.contains("1 coordinates"), "{message}");
            }
            other => panic!("Expected InvalidBounds, got {other:?}"),
        }
        assert!(matches!(
            mapper.to_real(&[0.1, 0.2, 0.3]),
            Err(BiteError::InvalidBounds { .. })
        ));

        let mut out = [0.0; 2];
        assert!(matches!(
            mapper.to_real_into(&[0.1], &mut out),
            Err(BiteError::InvalidBounds { .. })
        ));
    }

    fn bounded_point() -> impl Strategy<Value = (Vec<(f64, f64)>, Vec<f64>)> {
        prop::collection::vec((-1.0e6..1.0e6f64, 1.0e-3..1.0e6f64, 0.0..=1.0f64), 1..8).prop_map(
            |dims| {
                let bounds = dims.iter().map(|&(lo, width, _)| (lo, lo + width)).collect();
                let point = dims
                    .iter()
                    .map(|&(lo, width, t)| lo + width * t)
                    .collect();
                (bounds, point)
            },
        )
    }

    proptest! {
        #[test]
        fn round_trip_within_tolerance((bounds, point) in bounded_point()) {
            let mapper = CoordinateMapper::new(&SearchSpace::from_bounds(&bounds)).unwrap();
            let back = mapper.to_real(&mapper.to_internal(&point).unwrap()).unwrap();

            for (x, y) in point.iter().zip(&back) {
                let scale = x.abs().max(1.0);
                prop_assert!((x - y).abs() <= 1e-9 * scale, "{} != {}", x, y);
            }
        }

        #[test]
        fn internal_coordinates_stay_in_unit_cube((bounds, point) in bounded_point()) {
            let mapper = CoordinateMapper::new(&SearchSpace::from_bounds(&bounds)).unwrap();
            for v in mapper.to_internal(&point).unwrap() {
                prop_assert!((-1e-9..=1.0 + 1e-9).contains(&v));
            }
        }
    }
}
