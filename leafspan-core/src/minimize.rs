//! Bounded scalar minimisation
//!
//! Brent's method on a closed interval: parabolic interpolation through the
//! three best points so far, falling back to golden-section steps whenever
//! the parabola is unreliable or would leave the bracket. The search starts
//! at a caller supplied point inside the bounds. Unless that starting point
//! sits on a bound, the bounds themselves are never evaluated.
//!
//! # References
//!
//! Brent, R. P. (1973). Algorithms for Minimization without Derivatives,
//! chapter 5. Prentice-Hall.

use crate::errors::{require_positive, LeafspanError, LeafspanResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// (3 - √5) / 2
const GOLDEN_MEAN: FloatValue = 0.381_966_011_250_105_1;

/// Stopping rules for [`minimize_bounded`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinimizerSettings {
    /// Absolute tolerance on the minimiser location
    /// default: 1e-3
    pub xatol: FloatValue,
    /// Objective evaluations allowed before giving up
    /// default: 500
    pub max_evaluations: usize,
}

impl Default for MinimizerSettings {
    fn default() -> Self {
        Self {
            xatol: 1e-3,
            max_evaluations: 500,
        }
    }
}

impl MinimizerSettings {
    pub fn validate(&self) -> LeafspanResult<()> {
        require_positive("xatol", self.xatol)?;
        if self.max_evaluations == 0 {
            return Err(LeafspanError::InvalidInput(
                "max_evaluations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Converged minimiser location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Minimum {
    pub x: FloatValue,
    pub fx: FloatValue,
    pub evaluations: usize,
}

/// A point the search has evaluated.
#[derive(Debug, Clone, Copy)]
struct Probe {
    x: FloatValue,
    fx: FloatValue,
}

/// Minimise `f` over `[lower, upper]` starting from `x0`.
///
/// # Errors
///
/// - `InvalidInput` if the bounds are not an ordered finite pair, `x0` lies
///   outside them, or the settings are invalid
/// - `NonConvergence` if the evaluation budget runs out
/// - any error returned by `f`
pub fn minimize_bounded<F>(
    mut f: F,
    (lower, upper): (FloatValue, FloatValue),
    x0: FloatValue,
    settings: &MinimizerSettings,
) -> LeafspanResult<Minimum>
where
    F: FnMut(FloatValue) -> LeafspanResult<FloatValue>,
{
    settings.validate()?;
    if !(lower.is_finite() && upper.is_finite() && lower < upper) {
        return Err(LeafspanError::InvalidInput(format!(
            "bounds must be finite with lower < upper, got ({lower}, {upper})"
        )));
    }
    if !(lower..=upper).contains(&x0) {
        return Err(LeafspanError::InvalidInput(format!(
            "initial guess {x0} lies outside bounds ({lower}, {upper})"
        )));
    }

    let sqrt_eps = FloatValue::EPSILON.sqrt();
    let (mut a, mut b) = (lower, upper);

    // best, second best and previous second best points
    let mut best = Probe { x: x0, fx: f(x0)? };
    let mut second = best;
    let mut third = best;
    let mut evaluations = 1;

    let mut step: FloatValue = 0.0;
    let mut previous_step: FloatValue = 0.0;

    loop {
        let midpoint = 0.5 * (a + b);
        let tol1 = sqrt_eps * best.x.abs() + settings.xatol / 3.0;
        let tol2 = 2.0 * tol1;

        if (best.x - midpoint).abs() <= tol2 - 0.5 * (b - a) {
            break;
        }
        if evaluations >= settings.max_evaluations {
            return Err(LeafspanError::NonConvergence {
                iterations: evaluations,
                best: best.x,
            });
        }

        let mut golden = true;
        if previous_step.abs() > tol1 {
            let r = (best.x - second.x) * (best.fx - third.fx);
            let q = (best.x - third.x) * (best.fx - second.fx);
            let mut p = (best.x - third.x) * q - (best.x - second.x) * r;
            let mut q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            }
            q = q.abs();
            let step_before_last = previous_step;
            previous_step = step;

            if p.abs() < (0.5 * q * step_before_last).abs()
                && p > q * (a - best.x)
                && p < q * (b - best.x)
            {
                golden = false;
                step = p / q;
                let x = best.x + step;
                // Too close to a bound: nudge towards the midpoint instead
                if (x - a) < tol2 || (b - x) < tol2 {
                    step = if midpoint >= best.x { tol1 } else { -tol1 };
                }
            }
        }
        if golden {
            previous_step = if best.x >= midpoint {
                a - best.x
            } else {
                b - best.x
            };
            step = GOLDEN_MEAN * previous_step;
        }

        let direction = if step >= 0.0 { 1.0 } else { -1.0 };
        let x = best.x + direction * step.abs().max(tol1);
        let candidate = Probe { x, fx: f(x)? };
        evaluations += 1;

        trace!(
            x = candidate.x,
            fx = candidate.fx,
            golden,
            evaluations,
            "minimiser step"
        );

        if candidate.fx <= best.fx {
            if candidate.x >= best.x {
                a = best.x;
            } else {
                b = best.x;
            }
            third = second;
            second = best;
            best = candidate;
        } else {
            if candidate.x < best.x {
                a = candidate.x;
            } else {
                b = candidate.x;
            }
            if candidate.fx <= second.fx || second.x == best.x {
                third = second;
                second = candidate;
            } else if candidate.fx <= third.fx || third.x == best.x || third.x == second.x {
                third = candidate;
            }
        }
    }

    Ok(Minimum {
        x: best.x,
        fx: best.fx,
        evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MinimizerSettings {
        MinimizerSettings::default()
    }

    #[test]
    fn test_quadratic_minimum() {
        let min = minimize_bounded(|x| Ok((x - 3.0).powi(2)), (0.0, 10.0), 5.0, &settings())
            .unwrap();
        assert!((min.x - 3.0).abs() < 1e-3, "x = {}", min.x);
        assert!(min.fx < 1e-6);
        assert!(min.evaluations < 50);
    }

    #[test]
    fn test_parabolic_steps_keep_evaluations_low() {
        let quadratic = |x: FloatValue| {
            let d = x - 3.0;
            Ok(d * d)
        };
        let min = minimize_bounded(quadratic, (0.0, 10.0), 5.0, &settings()).unwrap();
        assert_eq!(min.evaluations, 6);

        let quartic = |x: FloatValue| {
            let d = x - 3.0;
            Ok(d * d * d * d + 0.5 * x)
        };
        let fine = MinimizerSettings {
            xatol: 1e-8,
            max_evaluations: 500,
        };
        let min = minimize_bounded(quartic, (0.0, 10.0), 5.0, &fine).unwrap();
        assert!((min.x - 2.5).abs() < 1e-6, "x = {}", min.x);
        assert_eq!(min.evaluations, 15);
    }

    #[test]
    fn test_start_on_bound() {
        let min =
            minimize_bounded(|x| Ok((x - 7.5).powi(2)), (1.0, 10.0), 1.0, &settings()).unwrap();
        assert!((min.x - 7.5).abs() < 1e-3, "x = {}", min.x);
    }

    #[test]
    fn test_monotone_function_approaches_lower_bound() {
        let min = minimize_bounded(Ok, (1.0, 1095.0), 50.0, &settings()).unwrap();
        assert!(min.x > 1.0);
        assert!(min.x - 1.0 < 1e-2, "x = {}", min.x);
    }

    #[test]
    fn test_non_smooth_function() {
        let min =
            minimize_bounded(|x| Ok((x - 2.0).abs()), (-5.0, 5.0), 4.0, &settings()).unwrap();
        assert!((min.x - 2.0).abs() < 1e-3, "x = {}", min.x);
    }

    #[test]
    fn test_budget_exhaustion() {
        let tight = MinimizerSettings {
            xatol: 1e-3,
            max_evaluations: 3,
        };
        let err = minimize_bounded(|x| Ok((x - 3.0).powi(2)), (0.0, 10.0), 5.0, &tight)
            .unwrap_err();
        match err {
            LeafspanError::NonConvergence { iterations, best } => {
                assert_eq!(iterations, 3);
                assert!((0.0..=10.0).contains(&best));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_invalid_arguments() {
        let f = |x: FloatValue| Ok(x * x);
        assert!(matches!(
            minimize_bounded(f, (0.0, 10.0), 11.0, &settings()),
            Err(LeafspanError::InvalidInput(_))
        ));
        assert!(matches!(
            minimize_bounded(f, (10.0, 0.0), 5.0, &settings()),
            Err(LeafspanError::InvalidInput(_))
        ));
        assert!(matches!(
            minimize_bounded(
                f,
                (0.0, 10.0),
                5.0,
                &MinimizerSettings {
                    xatol: 0.0,
                    max_evaluations: 10
                }
            ),
            Err(LeafspanError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_objective_errors_propagate() {
        let err = minimize_bounded(
            |x| {
                if x > 6.0 {
                    Err(LeafspanError::Photosynthesis("boom".to_string()))
                } else {
                    Ok(-x)
                }
            },
            (0.0, 10.0),
            5.0,
            &settings(),
        )
        .unwrap_err();
        assert_eq!(err, LeafspanError::Photosynthesis("boom".to_string()));
    }
}
