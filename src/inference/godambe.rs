//! inference::godambe — observed information and the Godambe (sandwich)
//! matrix of the composite H2 log-likelihood.
//!
//! Purpose
//! -------
//! Turn a model function `p ↦ expected H2 spectrum` into the curvature
//! `H = −∇²ℓ(p0)` of the log-likelihood, and, given bootstrap replicates of
//! the data, into the Godambe information `G = H J⁻¹ H`, where
//! `J = mean_b g_b g_bᵀ` averages the outer products of the bootstrap score
//! vectors `g_b = ∇ℓ_b(p0)`.
//!
//! Key behaviors
//! -------------
//! - Model spectra are memoized on the exact parameter vector for the
//!   duration of one call: the Hessian stencil and every bootstrap gradient
//!   share the same evaluation points, so each point is modelled once.
//! - Bootstrap presence is checked before the first model evaluation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Bootstrap replicates carry the same samples, bins and H flag as `data`.
//! - `J` must be invertible; with fewer bootstraps than parameters it is
//!   singular by construction.
use std::collections::HashMap;

use crate::inference::{
    errors::{InferenceError, InferenceResult},
    finite_diff::{gradient, hessian},
};
use crate::linalg::try_inverse;
use crate::optimization::{context::OptimizationContext, likelihood::log_likelihood};
use crate::spectra::h2::H2Spectrum;
use ndarray::{Array1, Array2, ArrayView1};

/// Model function memoized on the bit pattern of its argument.
struct CachedModel<M> {
    model_fn: M,
    cache: HashMap<Vec<u64>, H2Spectrum>,
}

impl<M> CachedModel<M>
where
    M: FnMut(&Array1<f64>) -> InferenceResult<H2Spectrum>,
{
    fn new(model_fn: M) -> Self {
        Self { model_fn, cache: HashMap::new() }
    }

    fn log_likelihood(
        &mut self, p: &Array1<f64>, data: &H2Spectrum, ctx: &OptimizationContext,
    ) -> InferenceResult<f64> {
        let key: Vec<u64> = p.iter().map(|x| x.to_bits()).collect();
        if !self.cache.contains_key(&key) {
            log::debug!("model cache miss at {p}");
            let model = (self.model_fn)(p)?;
            self.cache.insert(key.clone(), model);
        }
        let model = self.cache.get(&key).ok_or(InferenceError::UnknownError)?;
        Ok(log_likelihood(model, data, &mut ctx.inv_cov_cache())?)
    }

    fn n_models(&self) -> usize {
        self.cache.len()
    }
}

/// Godambe information matrix (or `H` alone) at `p0`.
///
/// Parameters
/// ----------
/// - `model_fn`: expected spectrum for a parameter vector.
/// - `data`: observed spectrum with covariances.
/// - `bootstraps`: bootstrap replicates of `data`; ignored when `just_h`.
/// - `delta`: relative finite-difference step.
/// - `just_h`: return `H = −∇²ℓ(p0)` instead of `G`.
/// - `ctx`: supplies the inverse-covariance cache.
///
/// Returns
/// -------
/// `H` when `just_h`, otherwise `G = H J⁻¹ H`.
///
/// Errors
/// ------
/// - [`InferenceError::MissingBootstraps`] if `!just_h` and `bootstraps` is
///   empty, before any evaluation.
/// - [`InferenceError::SingularMatrix`] if `J` cannot be inverted.
/// - Finite-difference, model, and likelihood errors.
pub fn godambe_matrix<M>(
    model_fn: M, p0: ArrayView1<f64>, data: &H2Spectrum, bootstraps: &[H2Spectrum], delta: f64,
    just_h: bool, ctx: &OptimizationContext,
) -> InferenceResult<Array2<f64>>
where
    M: FnMut(&Array1<f64>) -> InferenceResult<H2Spectrum>,
{
    if !just_h && bootstraps.is_empty() {
        return Err(InferenceError::MissingBootstraps);
    }
    let mut model = CachedModel::new(model_fn);

    let h = -hessian(|p| model.log_likelihood(p, data, ctx), p0, delta)?;
    if just_h {
        log::debug!("observed information from {} model evaluations", model.n_models());
        return Ok(h);
    }

    let n = p0.len();
    let mut j = Array2::<f64>::zeros((n, n));
    for bootstrap in bootstraps {
        let g = gradient(|p| model.log_likelihood(p, bootstrap, ctx), p0, delta)?;
        let g_col = g.view().insert_axis(ndarray::Axis(1));
        j += &g_col.dot(&g_col.t());
    }
    j /= bootstraps.len() as f64;
    log::debug!(
        "Godambe matrix from {} bootstraps and {} model evaluations",
        bootstraps.len(),
        model.n_models()
    );

    let j_inv =
        try_inverse(j.view()).ok_or(InferenceError::SingularMatrix { what: "bootstrap score" })?;
    Ok(h.dot(&j_inv).dot(&h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::test_support::{analytic_h2_rows, fixture, TRUE_N, TRUE_U};
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::cell::Cell;

    // Scope
    // -----
    // - Memoization of model evaluations.
    // - Bootstrap requirement and singular J.
    // - Positive definiteness of H and G at the truth.

    fn model_for(
        data: &H2Spectrum,
    ) -> impl FnMut(&Array1<f64>) -> InferenceResult<H2Spectrum> + '_ {
        move |p: &Array1<f64>| {
            let arr = analytic_h2_rows(p[0], p[1], TRUE_U, data.r_bins().view(), data.has_h());
            Ok(data.with_values(arr)?)
        }
    }

    #[test]
    // Purpose
    // -------
    // The observed information at the truth is symmetric positive definite
    // and every stencil point is modelled once.
    //
    // Given
    // -----
    // - Fixture data at the truth, two parameters.
    //
    // Expect
    // ------
    // - H = Hᵀ, positive diagonal and determinant.
    // - 1 + 2·2 + 4 = 9 distinct model evaluations.
    fn observed_information_is_positive_definite() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let calls = Cell::new(0);
        let mut inner = model_for(&fx.h2_data);
        let model = |p: &Array1<f64>| {
            calls.set(calls.get() + 1);
            inner(p)
        };
        let p0 = array![TRUE_N[0], TRUE_N[1]];

        // Act
        let h = godambe_matrix(model, p0.view(), &fx.h2_data, &[], 0.01, true, &ctx).unwrap();

        // Assert
        assert_eq!(h[[0, 1]], h[[1, 0]]);
        assert!(h[[0, 0]] > 0.0 && h[[1, 1]] > 0.0);
        assert!(h[[0, 0]] * h[[1, 1]] - h[[0, 1]] * h[[1, 0]] > 0.0);
        assert_eq!(calls.get(), 9);
    }

    #[test]
    // Purpose
    // -------
    // Without bootstraps the sandwich is refused before any evaluation.
    fn godambe_requires_bootstraps() {
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let calls = Cell::new(0);
        let model = |_: &Array1<f64>| {
            calls.set(calls.get() + 1);
            Ok(fx.h2_data.clone())
        };

        let err = godambe_matrix(
            model,
            array![TRUE_N[0], TRUE_N[1]].view(),
            &fx.h2_data,
            &[],
            0.01,
            false,
            &ctx,
        )
        .unwrap_err();

        assert_eq!(err, InferenceError::MissingBootstraps);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    // Purpose
    // -------
    // A model that ignores its parameters has zero scores, so J is singular.
    fn flat_model_gives_singular_j() {
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let bootstrap = fx.h2_data.with_values(fx.h2_data.arr() * 1.01).unwrap();
        let flat = |_: &Array1<f64>| Ok(fx.h2_data.clone());

        let err = godambe_matrix(
            flat,
            array![TRUE_N[0], TRUE_N[1]].view(),
            &fx.h2_data,
            &[bootstrap],
            0.01,
            false,
            &ctx,
        )
        .unwrap_err();

        assert_eq!(err, InferenceError::SingularMatrix { what: "bootstrap score" });
    }

    #[test]
    // Purpose
    // -------
    // Bootstraps that perturb different statistics give an invertible J
    // and a symmetric, positive definite Godambe matrix.
    //
    // Given
    // -----
    // - One replicate with the H row shifted by 1%, one with the H2 rows
    //   shifted by 1%, one scaled by 0.99.
    //
    // Expect
    // ------
    // - G symmetric up to rounding, positive diagonal and determinant.
    fn godambe_matrix_from_distinct_bootstraps() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let arr = fx.h2_data.arr();
        let n_bins = fx.h2_data.n_bins();
        let mut h_shift = arr.clone();
        h_shift[[n_bins, 0]] *= 1.01;
        let mut h2_shift = arr.clone();
        h2_shift.slice_mut(ndarray::s![..n_bins, ..]).mapv_inplace(|x| x * 1.01);
        let bootstraps = vec![
            fx.h2_data.with_values(h_shift).unwrap(),
            fx.h2_data.with_values(h2_shift).unwrap(),
            fx.h2_data.with_values(arr * 0.99).unwrap(),
        ];

        // Act
        let g = godambe_matrix(
            model_for(&fx.h2_data),
            array![TRUE_N[0], TRUE_N[1]].view(),
            &fx.h2_data,
            &bootstraps,
            0.01,
            false,
            &ctx,
        )
        .unwrap();

        // Assert
        assert_relative_eq!(g[[0, 1]], g[[1, 0]], max_relative = 1e-8);
        assert!(g[[0, 0]] > 0.0 && g[[1, 1]] > 0.0);
        assert!(g[[0, 0]] * g[[1, 1]] - g[[0, 1]] * g[[1, 0]] > 0.0);
    }
}
