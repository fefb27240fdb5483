//! inference::finite_diff — relative-step central differences.
//!
//! Purpose
//! -------
//! Approximate the Hessian and gradient of a scalar log-likelihood at a
//! fitted parameter vector. Steps are relative to the parameters
//! (`h_i = delta × p0_i`), which suits demographic parameters spanning many
//! orders of magnitude (sizes near `1e4`, mutation rates near `1e-8`).
//!
//! Key behaviors
//! -------------
//! - [`hessian`]: diagonal entries from the three-point stencil, off-diagonal
//!   entries from the four-point mixed stencil, each unordered pair computed
//!   once and mirrored.
//! - [`gradient`]: two-point central differences.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every `p0_i` must be non-zero and finite so that `h_i ≠ 0`; a zero step
//!   is reported as [`InferenceError::ZeroStep`] before any evaluation.
//! - Results are checked for finiteness ([`InferenceError::InvalidHessian`]).
//!
//! Conventions
//! -----------
//! - `f` is fallible; its first error aborts the computation.
use crate::inference::errors::{InferenceError, InferenceResult};
use ndarray::{Array1, Array2, ArrayView1};

/// Hessian of `f` at `p0` with steps `h = delta × p0`.
///
/// Parameters
/// ----------
/// - `f`: scalar function of the parameter vector.
/// - `p0`: evaluation point.
/// - `delta`: relative step size (e.g. `0.01`).
///
/// Returns
/// -------
/// Symmetric `n × n` matrix.
///
/// Errors
/// ------
/// - [`InferenceError::ZeroStep`] for a zero or non-finite step.
/// - [`InferenceError::InvalidHessian`] for a non-finite entry.
/// - Any error from `f`.
///
/// Notes
/// -----
/// - `f` is called `1 + 2n + 2n(n − 1)` times; callers with expensive
///   models memoize on the parameter vector.
pub fn hessian<F>(mut f: F, p0: ArrayView1<f64>, delta: f64) -> InferenceResult<Array2<f64>>
where
    F: FnMut(&Array1<f64>) -> InferenceResult<f64>,
{
    let hs = steps(p0, delta)?;
    let n = p0.len();
    let f0 = f(&p0.to_owned())?;
    let mut out = Array2::zeros((n, n));

    for i in 0..n {
        for j in i..n {
            let element = if i == j {
                let fp = f(&shifted(p0, &[(i, hs[i])]))?;
                let fm = f(&shifted(p0, &[(i, -hs[i])]))?;
                (fp - 2.0 * f0 + fm) / (hs[i] * hs[i])
            } else {
                let fpp = f(&shifted(p0, &[(i, hs[i]), (j, hs[j])]))?;
                let fpm = f(&shifted(p0, &[(i, hs[i]), (j, -hs[j])]))?;
                let fmp = f(&shifted(p0, &[(i, -hs[i]), (j, hs[j])]))?;
                let fmm = f(&shifted(p0, &[(i, -hs[i]), (j, -hs[j])]))?;
                (fpp - fpm - fmp + fmm) / (4.0 * hs[i] * hs[j])
            };
            if !element.is_finite() {
                return Err(InferenceError::InvalidHessian { row: i, col: j, value: element });
            }
            out[[i, j]] = element;
            out[[j, i]] = element;
        }
    }
    Ok(out)
}

/// Central-difference gradient of `f` at `p0` with steps `h = delta × p0`.
///
/// Errors
/// ------
/// - [`InferenceError::ZeroStep`] for a zero or non-finite step.
/// - [`InferenceError::InvalidHessian`] (with `col = 0`) for a non-finite
///   entry.
/// - Any error from `f`.
pub fn gradient<F>(mut f: F, p0: ArrayView1<f64>, delta: f64) -> InferenceResult<Array1<f64>>
where
    F: FnMut(&Array1<f64>) -> InferenceResult<f64>,
{
    let hs = steps(p0, delta)?;
    let mut out = Array1::zeros(p0.len());
    for i in 0..p0.len() {
        let fp = f(&shifted(p0, &[(i, hs[i])]))?;
        let fm = f(&shifted(p0, &[(i, -hs[i])]))?;
        let element = (fp - fm) / (2.0 * hs[i]);
        if !element.is_finite() {
            return Err(InferenceError::InvalidHessian { row: i, col: 0, value: element });
        }
        out[i] = element;
    }
    Ok(out)
}

// ---- Helper Methods ----

fn steps(p0: ArrayView1<f64>, delta: f64) -> InferenceResult<Array1<f64>> {
    let hs = p0.mapv(|p| delta * p);
    match hs.iter().position(|h| *h == 0.0 || !h.is_finite()) {
        Some(index) => Err(InferenceError::ZeroStep { index, value: p0[index] }),
        None => Ok(hs),
    }
}

fn shifted(p0: ArrayView1<f64>, shifts: &[(usize, f64)]) -> Array1<f64> {
    let mut p = p0.to_owned();
    for &(k, h) in shifts {
        p[k] += h;
    }
    p
}
