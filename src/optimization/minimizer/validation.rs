//! Validation helpers for the minimizers.
//!
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values.
//! - **Costs**: [`validate_value`] checks for finiteness.
//! - **Start vectors**: [`validate_start`] checks `p0` against its bounds.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::types::{Grad, Theta},
};

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// # Errors
/// - [`OptError::MissingThetaHat`] if no vector was provided.
/// - [`OptError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(OptError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(OptError::MissingThetaHat),
    }
}

/// Validate that a scalar cost is finite.
///
/// # Errors
/// Returns [`OptError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate a start vector against its bounds.
///
/// # Errors
/// - [`OptError::DimensionMismatch`] if `p0` and `bounds` differ in length.
/// - [`OptError::InvalidThetaHat`] if `p0` has non-finite entries.
pub fn validate_start(p0: &Theta, bounds: &[(f64, f64)]) -> OptResult<()> {
    if p0.len() != bounds.len() {
        return Err(OptError::DimensionMismatch {
            what: "start vector",
            expected: bounds.len(),
            found: p0.len(),
        });
    }
    for (index, &value) in p0.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Start values must be finite.",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Gradients of the wrong length or with NaNs are rejected.
    fn validate_grad_checks_length_and_finiteness() {
        assert!(validate_grad(&array![1.0, 2.0], 2).is_ok());
        assert_eq!(
            validate_grad(&array![1.0], 2),
            Err(OptError::GradientDimMismatch { expected: 2, found: 1 })
        );
        assert!(matches!(
            validate_grad(&array![1.0, f64::INFINITY], 2),
            Err(OptError::InvalidGradient { index: 1, .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // A start vector must match its bounds.
    fn validate_start_checks_length() {
        let bounds = [(0.0, 1.0), (0.0, 1.0)];

        assert!(validate_start(&array![0.5, 0.5], &bounds).is_ok());
        assert!(matches!(
            validate_start(&array![0.5], &bounds),
            Err(OptError::DimensionMismatch { what: "start vector", expected: 2, found: 1 })
        ));
    }
}
