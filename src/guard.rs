use tracing::{debug, warn};

use crate::error::PredictError;
use crate::outcome::ProbabilityVector;

/// Drift below this is floating noise and corrected silently.
const EXACT_EPSILON: f64 = 1e-12;

/// Brings any vector onto the probability simplex.
///
/// Entries above 1 mean percentage scale and divide by 100. Negative entries
/// become 0. A sum off by more than `tolerance` is rescaled with a log line;
/// smaller drift is rescaled quietly so the output always sums to 1. A zero
/// sum or any non-finite entry yields the equal split. Valid input comes
/// back unchanged.
pub fn validate(v: ProbabilityVector, tolerance: f64) -> ProbabilityVector {
    if !v.is_finite() {
        warn!(?v, "non-finite probabilities replaced with equal split");
        return ProbabilityVector::uniform();
    }

    let mut out = v;
    if out.max() > 1.0 {
        warn!(?v, "probabilities look like percentages, dividing by 100");
        out = out.map(|p| p / 100.0);
    }
    if out.min() < 0.0 {
        debug!(?v, "negative probabilities floored at zero");
        out = out.map(|p| p.max(0.0));
    }

    let sum = out.sum();
    if sum <= 0.0 {
        warn!(?v, "degenerate probabilities replaced with equal split");
        return ProbabilityVector::uniform();
    }
    let drift = (sum - 1.0).abs();
    if drift > tolerance {
        debug!(sum, "rescaling probabilities");
        out = out.map(|p| p / sum);
    } else if drift > EXACT_EPSILON {
        out = out.map(|p| p / sum);
    }

    out.map(|p| p.clamp(0.0, 1.0))
}

/// Reports what [`validate`] would have to fix, without fixing it.
pub fn check(v: &ProbabilityVector, tolerance: f64) -> Result<(), PredictError> {
    if !v.is_finite() {
        return Err(PredictError::InvalidProbabilityVector(format!(
            "non-finite entries {v:?}"
        )));
    }
    if v.min() < 0.0 || v.max() > 1.0 {
        return Err(PredictError::InvalidProbabilityVector(format!(
            "entries outside [0, 1] {v:?}"
        )));
    }
    let sum = v.sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(PredictError::InvalidProbabilityVector(format!(
            "sum {sum:.4} is not 1"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 0.01;

    fn assert_simplex(v: &ProbabilityVector) {
        assert!((v.sum() - 1.0).abs() < 1e-9, "sum {}", v.sum());
        for p in v.values() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn valid_vector_is_left_alone_and_idempotent() {
        let v = ProbabilityVector::new(0.5, 0.25, 0.25);
        assert_eq!(validate(v, TOL), v);
        let once = validate(ProbabilityVector::new(0.7, 0.7, 0.2), TOL);
        assert_eq!(validate(once, TOL), once);
    }

    #[test]
    fn oversized_sum_is_rescaled() {
        let v = validate(ProbabilityVector::new(0.6, 0.6, 0.6), TOL);
        assert_simplex(&v);
        assert!((v.home - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn percentage_scale_is_detected() {
        let v = validate(ProbabilityVector::new(50.0, 30.0, 20.0), TOL);
        assert_simplex(&v);
        assert!((v.home - 0.5).abs() < 1e-12);
        assert!((v.away - 0.2).abs() < 1e-12);
    }

    #[test]
    fn degenerate_and_nan_become_uniform() {
        assert_eq!(
            validate(ProbabilityVector::new(0.0, 0.0, 0.0), TOL),
            ProbabilityVector::uniform()
        );
        assert_eq!(
            validate(ProbabilityVector::new(f64::NAN, 0.5, 0.5), TOL),
            ProbabilityVector::uniform()
        );
        assert_eq!(
            validate(ProbabilityVector::new(-1.0, -2.0, 0.0), TOL),
            ProbabilityVector::uniform()
        );
    }

    #[test]
    fn negatives_are_floored_then_normalized() {
        let v = validate(ProbabilityVector::new(-0.2, 0.6, 0.6), TOL);
        assert_simplex(&v);
        assert_eq!(v.home, 0.0);
        assert!((v.draw - 0.5).abs() < 1e-12);
    }

    #[test]
    fn small_drift_still_sums_to_one() {
        let v = validate(ProbabilityVector::new(0.5, 0.3, 0.205), TOL);
        assert_simplex(&v);
    }

    #[test]
    fn check_flags_bad_vectors() {
        assert!(check(&ProbabilityVector::new(0.5, 0.3, 0.2), TOL).is_ok());
        assert!(check(&ProbabilityVector::new(0.6, 0.6, 0.6), TOL).is_err());
        assert!(check(&ProbabilityVector::new(f64::NAN, 0.0, 1.0), TOL).is_err());
    }
}
