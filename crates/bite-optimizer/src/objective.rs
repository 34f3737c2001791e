//! Objective functions and the counting evaluator.

use bite_types::{BiteError, BiteResult, CoordinateMapper, ObjectiveError};

/// A function to minimize over caller coordinates.
///
/// Returning an error aborts the whole optimization run. NaN and infinite
/// values are allowed and rank worse than any finite value.
///
/// Any closure `Fn(&[f64]) -> Result<f64, E>` whose error converts into
/// [`ObjectiveError`] is an objective; wrap infallible closures with
/// [`from_fn`].
pub trait Objective {
    fn evaluate(&self, x: &[f64]) -> Result<f64, ObjectiveError>;
}

impl<F, E> Objective for F
where
    F: Fn(&[f64]) -> Result<f64, E>,
    E: Into<ObjectiveError>,
{
    fn evaluate(&self, x: &[f64]) -> Result<f64, ObjectiveError> {
        self(x).map_err(Into::into)
    }
}

/// Adapter for objectives that cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct FnObjective<F>(F);

impl<F> Objective for FnObjective<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn evaluate(&self, x: &[f64]) -> Result<f64, ObjectiveError> {
        Ok((self.0)(x))
    }
}

pub fn from_fn<F>(f: F) -> FnObjective<F>
where
    F: Fn(&[f64]) -> f64,
{
    FnObjective(f)
}

/// Counts every objective call of one attempt and maps normalized points to
/// caller coordinates before invoking the objective.
pub struct Evaluator<'a, O: ?Sized> {
    objective: &'a O,
    mapper: &'a CoordinateMapper,
    real: Vec<f64>,
    evaluations: usize,
}

impl<'a, O> Evaluator<'a, O>
where
    O: Objective + ?Sized,
{
    pub fn new(objective: &'a O, mapper: &'a CoordinateMapper) -> Self {
        Self {
            objective,
            mapper,
            real: vec![0.0; mapper.dims()],
            evaluations: 0,
        }
    }

    /// Evaluate a normalized point. The returned value is the objective's,
    /// unmodified.
    ///
    /// A point of the wrong length never reaches the objective; it fails with
    /// [`BiteError::DimensionMismatch`].
    pub fn evaluate(&mut self, norm: &[f64]) -> BiteResult<f64> {
        if norm.len() != self.real.len() {
            return Err(BiteError::DimensionMismatch {
                expected: self.real.len(),
                actual: norm.len(),
            });
        }
        self.mapper.to_real_into(norm, &mut self.real)?;
        self.evaluations += 1;
        self.objective
            .evaluate(&self.real)
            .map_err(BiteError::Objective)
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bite_types::SearchSpace;
    use std::cell::RefCell;

    fn mapper() -> CoordinateMapper {
        CoordinateMapper::new(&SearchSpace::from_bounds(&[(-2.0, 2.0), (0.0, 10.0)])).unwrap()
    }

    #[test]
    fn evaluator_maps_and_counts() {
        let seen = RefCell::new(Vec::new());
        let objective = from_fn(|x: &[f64]| {
            seen.borrow_mut().push(x.to_vec());
            x[0] + x[1]
        });
        let mapper = mapper();
        let mut evaluator = Evaluator::new(&objective, &mapper);

        let value = evaluator.evaluate(&[0.5, 0.5]).unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(evaluator.evaluations(), 1);
        assert_eq!(seen.borrow()[0], vec![0.0, 5.0]);

        evaluator.evaluate(&[1.0, 0.0]).unwrap();
        assert_eq!(evaluator.evaluations(), 2);
    }

    #[test]
    fn wrong_length_point_never_reaches_objective() {
        let calls = RefCell::new(0usize);
        let objective = from_fn(|_: &[f64]| {
            *calls.borrow_mut() += 1;
            0.0
        });
        let mapper = mapper();
        let mut evaluator = Evaluator::new(&objective, &mapper);

        let err = evaluator.evaluate(&[0.5]).unwrap_err();
        assert!(matches!(
            err,
            BiteError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(evaluator.evaluations(), 0);
    }

    #[test]
    fn non_finite_values_pass_through_unmodified() {
        let objective = from_fn(|_: &[f64]| f64::NAN);
        let mapper = mapper();
        let mut evaluator = Evaluator::new(&objective, &mapper);
        assert!(evaluator.evaluate(&[0.1, 0.2]).unwrap().is_nan());
    }

    #[test]
    fn fallible_closure_error_is_propagated() {
        let objective = |x: &[f64]| -> Result<f64, String> {
            if x[0] > 0.0 {
                Err(format!("refusing x0={}", x[0]))
            } else {
                Ok(0.0)
            }
        };
        let mapper = mapper();
        let mut evaluator = Evaluator::new(&objective, &mapper);

        assert_eq!(evaluator.evaluate(&[0.25, 0.0]).unwrap(), 0.0);
        let err = evaluator.evaluate(&[1.0, 0.0]).unwrap_err();
        assert!(err.is_objective());
        assert_eq!(err.to_string(), "refusing x0=2");
        assert_eq!(evaluator.evaluations(), 2);
    }
}
