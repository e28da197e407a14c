use thiserror::Error;

use crate::FloatValue;

/// Error type for failed carbon gain or lifespan computations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LeafspanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Minimiser did not converge after {iterations} evaluations (best lifespan={best:.3} days)")]
    NonConvergence {
        iterations: usize,
        best: FloatValue,
    },
    #[error("Numerical degeneracy: {0}")]
    NumericalDegeneracy(String),
    #[error("Photosynthesis model failed: {0}")]
    Photosynthesis(String),
}

impl LeafspanError {
    /// Whether this error came from the minimiser running out of evaluations
    pub fn is_non_convergence(&self) -> bool {
        matches!(self, LeafspanError::NonConvergence { .. })
    }
}

/// Convenience type for `Result<T, LeafspanError>`.
pub type LeafspanResult<T> = Result<T, LeafspanError>;

/// Fail with `InvalidInput` unless `value` is finite.
pub(crate) fn require_finite(name: &str, value: FloatValue) -> LeafspanResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LeafspanError::InvalidInput(format!(
            "{name} must be finite, got {value}"
        )))
    }
}

/// Fail with `InvalidInput` unless `value` is finite and strictly positive.
pub(crate) fn require_positive(name: &str, value: FloatValue) -> LeafspanResult<()> {
    require_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(LeafspanError::InvalidInput(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// Fail with `InvalidInput` unless `value` is finite and not negative.
pub(crate) fn require_non_negative(name: &str, value: FloatValue) -> LeafspanResult<()> {
    require_finite(name, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(LeafspanError::InvalidInput(format!(
            "{name} must not be negative, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_positive_rejects_zero_and_nan() {
        assert!(require_positive("x", 1.0).is_ok());
        assert!(matches!(
            require_positive("x", 0.0),
            Err(LeafspanError::InvalidInput(_))
        ));
        assert!(matches!(
            require_positive("x", FloatValue::NAN),
            Err(LeafspanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_convergence_message() {
        let err = LeafspanError::NonConvergence {
            iterations: 3,
            best: 12.5,
        };
        assert!(err.is_non_convergence());
        assert_eq!(
            err.to_string(),
            "Minimiser did not converge after 3 evaluations (best lifespan=12.500 days)"
        );
    }
}
