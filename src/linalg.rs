//! linalg — small dense linear-algebra helpers shared across the crate.
//!
//! Purpose
//! -------
//! Bridge between `ndarray` (the crate's storage type) and `nalgebra`
//! (used for inversion), and provide the unbiased sample covariance used
//! by the bootstrap.
//!
//! Conventions
//! -----------
//! - Square matrices only where inversion is concerned; other shapes are
//!   reported, never panicked on.
//! - Covariances use the `n - 1` denominator.
use crate::optimization::errors::{OptError, OptResult};
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2, Axis};

/// Copy a square `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// Errors
/// ------
/// - [`OptError::DimensionMismatch`] if `m` is not square.
pub fn to_dmatrix(m: ArrayView2<f64>) -> OptResult<DMatrix<f64>> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(OptError::DimensionMismatch {
            what: "square matrix columns",
            expected: n,
            found: m.ncols(),
        });
    }
    Ok(DMatrix::from_fn(n, n, |i, j| m[[i, j]]))
}

pub fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// Inverse of a square matrix, or `None` when it is singular or the
/// result is not finite.
pub fn try_inverse(m: ArrayView2<f64>) -> Option<Array2<f64>> {
    let inv = to_dmatrix(m).ok()?.try_inverse()?;
    let out = from_dmatrix(&inv);
    out.iter().all(|v| v.is_finite()).then_some(out)
}

/// Unbiased covariance of the columns of `samples` (`n × k` → `k × k`).
///
/// Notes
/// -----
/// - With fewer than two rows the denominator is zero and every entry is
///   non-finite; callers require at least two samples.
pub fn sample_covariance(samples: ArrayView2<f64>) -> Array2<f64> {
    let n = samples.nrows();
    let k = samples.ncols();
    let mean = match samples.mean_axis(Axis(0)) {
        Some(mean) => mean,
        None => return Array2::from_elem((k, k), f64::NAN),
    };
    let centered = &samples - &mean;
    centered.t().dot(&centered) / (n as f64 - 1.0)
}
