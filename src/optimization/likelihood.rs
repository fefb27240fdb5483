//! optimization::likelihood — Gaussian composite log-likelihood of H2 spectra.
//!
//! Purpose
//! -------
//! Score a model H2 spectrum against a data spectrum bin by bin, using the
//! data covariance of each bin, and sum the per-bin terms into one
//! composite log-likelihood.
//!
//! Key behaviors
//! -------------
//! - Each bin contributes `−(x − μ)ᵀ Σ⁻¹ (x − μ)`; the normalizing constant
//!   is omitted since it does not depend on the model.
//! - All shape checks run before the first inversion.
//! - Inverses are cached per bin index in [`InvCovCache`] and reused only
//!   while the stored covariance equals the one presented.
//!
//! Invariants & assumptions
//! ------------------------
//! - `xs`, `mus` and `covs` have one leading entry per bin; every bin's
//!   vectors have the covariance dimension.
//!
//! Testing notes
//! -------------
//! - The identity `log_gaussian(x, x, ·) == 0`, a hand-computed value, and
//!   cache refresh on a changed covariance are covered below.
use crate::linalg::try_inverse;
use crate::optimization::errors::{OptError, OptResult};
use crate::spectra::h2::H2Spectrum;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayView3, Axis};
use std::collections::HashMap;

/// Unnormalized Gaussian log-density `−(x − μ)ᵀ Σ⁻¹ (x − μ)`.
pub fn log_gaussian(x: ArrayView1<f64>, mu: ArrayView1<f64>, inv_cov: ArrayView2<f64>) -> f64 {
    let d = &x - &mu;
    -d.dot(&inv_cov.dot(&d))
}

#[derive(Debug, Clone)]
struct CacheEntry {
    cov: Array2<f64>,
    inv: Array2<f64>,
}

/// Inverse covariance matrices keyed by bin index.
#[derive(Debug, Clone, Default)]
pub struct InvCovCache {
    entries: HashMap<usize, CacheEntry>,
    n_inversions: usize,
}

impl InvCovCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inverse of `cov`, reusing the cached one when bin `bin` was last
    /// seen with an identical covariance.
    ///
    /// Errors
    /// ------
    /// - [`OptError::SingularCovariance`] if `cov` cannot be inverted.
    pub fn inverse(&mut self, bin: usize, cov: ArrayView2<f64>) -> OptResult<&Array2<f64>> {
        let stale = self.entries.get(&bin).map_or(true, |entry| entry.cov != cov);
        if stale {
            log::debug!("inverting covariance of bin {bin}");
            let inv = try_inverse(cov).ok_or(OptError::SingularCovariance { bin })?;
            self.n_inversions += 1;
            self.entries.insert(bin, CacheEntry { cov: cov.to_owned(), inv });
        }
        self.entries.get(&bin).map(|entry| &entry.inv).ok_or(OptError::UnknownError)
    }

    /// Number of matrix inversions performed so far.
    pub fn n_inversions(&self) -> usize {
        self.n_inversions
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Per-bin log-likelihoods of data rows `xs` given model rows `mus`.
///
/// Parameters
/// ----------
/// - `xs`: `(n_bins × k)` data values.
/// - `mus`: `(n_bins × k)` model expectations.
/// - `covs`: `(n_bins × k × k)` data covariances.
/// - `cache`: inverse-covariance cache reused across calls.
///
/// Errors
/// ------
/// - [`OptError::DimensionMismatch`] when bin counts or bin lengths differ,
///   raised before any inversion.
/// - [`OptError::SingularCovariance`] if a bin covariance is singular.
pub fn bin_log_likelihoods(
    xs: ArrayView2<f64>, mus: ArrayView2<f64>, covs: ArrayView3<f64>, cache: &mut InvCovCache,
) -> OptResult<Array1<f64>> {
    let n_bins = xs.nrows();
    if mus.nrows() != n_bins {
        return Err(OptError::DimensionMismatch {
            what: "model bins",
            expected: n_bins,
            found: mus.nrows(),
        });
    }
    if covs.len_of(Axis(0)) != n_bins {
        return Err(OptError::DimensionMismatch {
            what: "covariance bins",
            expected: n_bins,
            found: covs.len_of(Axis(0)),
        });
    }
    let (_, k1, k2) = covs.dim();
    if k1 != k2 {
        return Err(OptError::DimensionMismatch {
            what: "covariance columns",
            expected: k1,
            found: k2,
        });
    }
    if xs.ncols() != k1 {
        return Err(OptError::DimensionMismatch {
            what: "data length",
            expected: k1,
            found: xs.ncols(),
        });
    }
    if mus.ncols() != k1 {
        return Err(OptError::DimensionMismatch {
            what: "model length",
            expected: k1,
            found: mus.ncols(),
        });
    }

    let mut out = Array1::zeros(n_bins);
    for bin in 0..n_bins {
        let inv = cache.inverse(bin, covs.index_axis(Axis(0), bin))?;
        out[bin] = log_gaussian(xs.row(bin), mus.row(bin), inv.view());
    }
    Ok(out)
}

/// Composite log-likelihood of `data` given `model`: the sum of
/// [`bin_log_likelihoods`] over all rows, H row included when present.
///
/// Errors
/// ------
/// - [`OptError::MissingCovariance`] if `data` has no covariances.
/// - Everything [`bin_log_likelihoods`] raises.
pub fn log_likelihood(
    model: &H2Spectrum, data: &H2Spectrum, cache: &mut InvCovCache,
) -> OptResult<f64> {
    let covs = data.covs().ok_or(OptError::MissingCovariance)?;
    let lls = bin_log_likelihoods(data.arr().view(), model.arr().view(), covs.view(), cache)?;
    Ok(lls.sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array3};

    // Scope
    // -----
    // - Value of the unnormalized Gaussian.
    // - Cache reuse and refresh.
    // - Shape checks ahead of inversion; missing covariances.

    #[test]
    // Purpose
    // -------
    // A point scored against itself has log-likelihood zero.
    fn log_gaussian_is_zero_at_mean() {
        // Arrange
        let x = array![0.3, -1.2, 4.0];
        let inv = array![[2.0, 0.1, 0.0], [0.1, 1.0, 0.0], [0.0, 0.0, 5.0]];

        // Act
        let ll = log_gaussian(x.view(), x.view(), inv.view());

        // Assert
        assert_eq!(ll, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // The quadratic form matches a hand computation.
    //
    // Given
    // -----
    // - d = x − μ = [1, 2], Σ⁻¹ = diag(2, 0.5).
    //
    // Expect
    // ------
    // - −(2·1 + 0.5·4) = −4.
    fn log_gaussian_matches_quadratic_form() {
        let x = array![2.0, 3.0];
        let mu = array![1.0, 1.0];
        let inv = array![[2.0, 0.0], [0.0, 0.5]];

        assert_relative_eq!(log_gaussian(x.view(), mu.view(), inv.view()), -4.0);
    }

    #[test]
    // Purpose
    // -------
    // The cache never serves an inverse for a covariance it was not built
    // from.
    //
    // Given
    // -----
    // - Bin 0 queried with Σ = 2I twice, then with Σ = 4I.
    //
    // Expect
    // ------
    // - Two inversions in total; the last inverse is I / 4.
    fn inv_cov_cache_refreshes_on_changed_covariance() {
        // Arrange
        let mut cache = InvCovCache::new();
        let a = Array2::<f64>::eye(2) * 2.0;
        let b = Array2::<f64>::eye(2) * 4.0;

        // Act
        let first = cache.inverse(0, a.view()).unwrap().clone();
        cache.inverse(0, a.view()).unwrap();
        let second = cache.inverse(0, b.view()).unwrap().clone();

        // Assert
        assert_eq!(cache.n_inversions(), 2);
        assert_relative_eq!(first[[0, 0]], 0.5);
        assert_relative_eq!(second[[0, 0]], 0.25);
        assert_relative_eq!(second[[1, 1]], 0.25);
    }

    #[test]
    // Purpose
    // -------
    // A length mismatch is reported before the (singular) covariance is
    // touched.
    fn dimension_mismatch_precedes_inversion() {
        // Arrange
        let xs = array![[1.0, 2.0, 3.0]];
        let mus = array![[1.0, 2.0]];
        let covs = Array3::<f64>::zeros((1, 2, 2));
        let mut cache = InvCovCache::new();

        // Act
        let err = bin_log_likelihoods(xs.view(), mus.view(), covs.view(), &mut cache).unwrap_err();

        // Assert
        assert!(matches!(err, OptError::DimensionMismatch { .. }));
        assert_eq!(cache.n_inversions(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Singular covariances and spectra without covariances are errors.
    fn singular_and_missing_covariances_fail() {
        // Arrange
        let ids = vec!["A".to_string()];
        let bins = array![0.0, 1e-3];
        let model = H2Spectrum::new(ids.clone(), bins.clone(), array![[1.0]], None, false).unwrap();
        let singular = H2Spectrum::new(
            ids.clone(),
            bins.clone(),
            array![[1.0]],
            Some(Array3::zeros((1, 1, 1))),
            false,
        )
        .unwrap();
        let mut cache = InvCovCache::new();

        // Act / Assert
        assert_eq!(
            log_likelihood(&model, &model, &mut cache).unwrap_err(),
            OptError::MissingCovariance
        );
        assert_eq!(
            log_likelihood(&model, &singular, &mut cache).unwrap_err(),
            OptError::SingularCovariance { bin: 0 }
        );
    }
}
