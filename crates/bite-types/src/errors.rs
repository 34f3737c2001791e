use thiserror::Error;

/// Error produced by a caller-supplied objective function.
///
/// Kept boxed so any error type can travel through the minimizer untouched
/// and be downcast again by the caller.
pub type ObjectiveError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the minimizer
#[derive(Error, Debug)]
pub enum BiteError {
    #[error("Invalid bounds: {message}")]
    InvalidBounds { message: String },

    #[error("Invalid parameter {parameter}: {message}")]
    InvalidParameter { parameter: String, message: String },

    /// The objective failed; the caller's error is carried verbatim.
    #[error("{0}")]
    Objective(#[source] ObjectiveError),

    #[error("Dimension mismatch: expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Optimization cancelled after {evaluations} evaluations")]
    Cancelled { evaluations: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BiteError {
    /// Wrap a caller error raised inside the objective.
    pub fn objective<E>(error: E) -> Self
    where
        E: Into<ObjectiveError>,
    {
        Self::Objective(error.into())
    }

    /// The caller's original error, if this is an objective failure.
    pub fn objective_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Objective(inner) => Some(inner.as_ref()),
            _ => None,
        }
    }

    pub fn is_objective(&self) -> bool {
        matches!(self, Self::Objective(_))
    }
}

/// Result type alias for minimizer operations
pub type BiteResult<T> = Result<T, BiteError>;

/// Macro for creating parameter validation errors
#[macro_export]
macro_rules! invalid_parameter {
    ($param:expr, $($arg:tt)*) => {
        $crate::BiteError::InvalidParameter {
            parameter: $param.to_string(),
            message: format!($($arg)*),
        }
    };
}

/// Macro for creating bounds validation errors
#[macro_export]
macro_rules! invalid_bounds {
    ($($arg:tt)*) => {
        $crate::BiteError::InvalidBounds {
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom at call 3")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn test_error_display() {
        let error = BiteError::DimensionMismatch {
            expected: 3,
            actual: 2,
        };

        assert!(error.to_string().contains("Dimension mismatch"));
        assert!(error.to_string().contains('3'));
        assert!(error.to_string().contains('2'));
    }

    #[test]
    fn test_objective_error_is_verbatim() {
        let error = BiteError::objective(Boom);
        assert_eq!(error.to_string(), "boom at call 3");
        assert!(error.is_objective());

        let inner = error.objective_error().unwrap();
        assert!(inner.downcast_ref::<Boom>().is_some());
    }

    #[test]
    fn test_objective_error_from_str() {
        let error = BiteError::objective("bad input");
        assert_eq!(error.to_string(), "bad input");
    }

    #[test]
    fn test_macros() {
        let err = invalid_parameter!("depth", "must be below 36, got {}", 40);
        match err {
            BiteError::InvalidParameter { parameter, message } => {
                assert_eq!(parameter, "depth");
                assert!(message.contains("40"));
            }
            other => panic!("Expected InvalidParameter, got {other:?}"),
        }

        let err = invalid_bounds!("dimension {} is degenerate", 0);
        assert!(matches!(err, BiteError::InvalidBounds { .. }));
    }

    #[test]
    fn test_serde_error_conversion() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: BiteError = parse.into();
        assert!(matches!(err, BiteError::Serialization(_)));
    }
}
