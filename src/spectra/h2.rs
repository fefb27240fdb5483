//! spectra::h2 — two-locus heterozygosity spectra.
//!
//! Purpose
//! -------
//! Represent observed or expected H2 statistics: one row per
//! recombination-distance bin (optionally followed by one row of
//! one-locus H), one column per unordered sample pair, and, for observed
//! data, one covariance matrix per row.
//!
//! Key behaviors
//! -------------
//! - Pair columns enumerate all unordered pairs including self-pairs in
//!   `i <= j` order of `sample_ids`; this order is fixed by construction.
//! - [`H2Spectrum::from_archive`] turns bootstrap output into a data
//!   spectrum; [`H2Spectrum::from_graph`] asks a model evaluator for the
//!   expectation under a graph.
//! - [`H2Spectrum::bootstrap_replicates`] yields one spectrum per bootstrap
//!   draw, sharing the data covariances, for Godambe estimation.
//!
//! Invariants & assumptions
//! ------------------------
//! - `arr` is `(n_bins + has_h) × n_pairs`, where `n_bins = r_bins.len() - 1`.
//! - When present, `covs` is `(n_rows × n_pairs × n_pairs)`.
//! - Sample ids are unique.
//!
//! Downstream usage
//! ----------------
//! - The likelihood engine pairs model rows with data rows and data
//!   covariances, bin by bin.
use crate::graph::demes::DemeGraph;
use crate::model::H2Evaluator;
use crate::spectra::{
    bootstrap::H2Archive,
    errors::{StatsError, StatsResult},
};
use ndarray::{concatenate, s, Array1, Array2, Array3, ArrayView1, Axis};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct H2Spectrum {
    sample_ids: Vec<String>,
    ids: Vec<(String, String)>,
    r_bins: Array1<f64>,
    arr: Array2<f64>,
    covs: Option<Array3<f64>>,
    has_h: bool,
}

/// All unordered pairs of `sample_ids`, self-pairs included, `i <= j`.
pub fn pair_ids(sample_ids: &[String]) -> Vec<(String, String)> {
    let n = sample_ids.len();
    let mut ids = Vec::with_capacity(n * (n + 1) / 2);
    for i in 0..n {
        for j in i..n {
            ids.push((sample_ids[i].clone(), sample_ids[j].clone()));
        }
    }
    ids
}

// ---- Construction ----

impl H2Spectrum {
    /// Validated spectrum.
    ///
    /// Errors
    /// ------
    /// - [`StatsError::InvalidShape`] for empty or duplicate sample ids or a
    ///   covariance array of the wrong shape.
    /// - [`StatsError::DimensionMismatch`] when `r_bins` has fewer than two
    ///   edges or `arr` does not have one row per bin (plus H) and one
    ///   column per pair.
    pub fn new(
        sample_ids: Vec<String>, r_bins: Array1<f64>, arr: Array2<f64>, covs: Option<Array3<f64>>,
        has_h: bool,
    ) -> StatsResult<Self> {
        if sample_ids.is_empty() {
            return Err(StatsError::InvalidShape { reason: "no sample ids".to_string() });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = sample_ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(StatsError::InvalidShape { reason: format!("duplicate sample id '{dup}'") });
        }
        if r_bins.len() < 2 {
            return Err(StatsError::DimensionMismatch {
                what: "recombination bin edges",
                expected: 2,
                found: r_bins.len(),
            });
        }
        let ids = pair_ids(&sample_ids);
        let n_rows = r_bins.len() - 1 + usize::from(has_h);
        if arr.ncols() != ids.len() {
            return Err(StatsError::DimensionMismatch {
                what: "pair columns",
                expected: ids.len(),
                found: arr.ncols(),
            });
        }
        if arr.nrows() != n_rows {
            return Err(StatsError::DimensionMismatch {
                what: "spectrum rows",
                expected: n_rows,
                found: arr.nrows(),
            });
        }
        if let Some(c) = &covs {
            if c.dim() != (n_rows, ids.len(), ids.len()) {
                return Err(StatsError::InvalidShape {
                    reason: format!(
                        "covariances have shape {:?}; expected ({n_rows}, {p}, {p})",
                        c.dim(),
                        p = ids.len()
                    ),
                });
            }
        }
        Ok(Self { sample_ids, ids, r_bins, arr, covs, has_h })
    }

    /// Data spectrum from bootstrap output: bootstrap means as values and
    /// bootstrap covariances as `covs`, with the H row appended when
    /// `use_h` is set.
    pub fn from_archive(archive: &H2Archive, use_h: bool) -> StatsResult<Self> {
        archive.check_pairs()?;
        let (arr, covs) = if use_h {
            let arr = concatenate(
                Axis(0),
                &[archive.h2_mean.view(), archive.h_mean.view().insert_axis(Axis(0))],
            )
            .map_err(|e| StatsError::InvalidShape { reason: e.to_string() })?;
            let covs = concatenate(
                Axis(0),
                &[archive.h2_cov.view(), archive.h_cov.view().insert_axis(Axis(0))],
            )
            .map_err(|e| StatsError::InvalidShape { reason: e.to_string() })?;
            (arr, covs)
        } else {
            (archive.h2_mean.clone(), archive.h2_cov.clone())
        };
        Self::new(archive.sample_ids.clone(), archive.r_bins.clone(), arr, Some(covs), use_h)
    }

    /// Expected spectrum under `graph`, delegated to `evaluator`.
    ///
    /// Errors
    /// ------
    /// - Any evaluator error.
    /// - [`StatsError::InvalidShape`] if the returned spectrum does not match
    ///   the requested samples, bins, or H flag.
    pub fn from_graph<E: H2Evaluator + ?Sized>(
        evaluator: &E, graph: &DemeGraph, sample_ids: &[String], r_bins: ArrayView1<f64>, u: f64,
        get_h: bool,
    ) -> StatsResult<Self> {
        let spectrum = evaluator.expected_h2(graph, sample_ids, r_bins, u, get_h)?;
        if spectrum.sample_ids != sample_ids
            || spectrum.has_h != get_h
            || spectrum.r_bins.len() != r_bins.len()
        {
            return Err(StatsError::InvalidShape {
                reason: "evaluator returned a spectrum for different samples or bins".to_string(),
            });
        }
        Ok(spectrum)
    }

    /// Same samples, bins and covariances with new values.
    pub fn with_values(&self, arr: Array2<f64>) -> StatsResult<Self> {
        Self::new(self.sample_ids.clone(), self.r_bins.clone(), arr, self.covs.clone(), self.has_h)
    }
}

// ---- Transformations ----

impl H2Spectrum {
    /// Copy without the H row (and its covariance). A spectrum without H is
    /// returned unchanged.
    pub fn remove_h(&self) -> Self {
        if !self.has_h {
            return self.clone();
        }
        let n_bins = self.n_bins();
        Self {
            sample_ids: self.sample_ids.clone(),
            ids: self.ids.clone(),
            r_bins: self.r_bins.clone(),
            arr: self.arr.slice(s![..n_bins, ..]).to_owned(),
            covs: self.covs.as_ref().map(|c| c.slice(s![..n_bins, .., ..]).to_owned()),
            has_h: false,
        }
    }

    /// Restrict to the pairs among `sample_ids`, in the given order.
    pub fn subset(&self, sample_ids: &[String]) -> StatsResult<Self> {
        let pairs = pair_ids(sample_ids);
        let idx = pairs
            .iter()
            .map(|(a, b)| {
                self.ids
                    .iter()
                    .position(|(x, y)| (x == a && y == b) || (x == b && y == a))
                    .ok_or_else(|| {
                        let missing = if self.sample_ids.contains(a) { b } else { a };
                        StatsError::UnknownSample { name: missing.clone() }
                    })
            })
            .collect::<StatsResult<Vec<usize>>>()?;
        let arr = self.arr.select(Axis(1), &idx);
        let covs = self.covs.as_ref().map(|c| c.select(Axis(1), &idx).select(Axis(2), &idx));
        Self::new(sample_ids.to_vec(), self.r_bins.clone(), arr, covs, self.has_h)
    }

    /// One spectrum per bootstrap draw in `archive`.
    ///
    /// Notes
    /// -----
    /// - Each replicate shares this spectrum's covariances.
    /// - The archive must describe the same sample pairs in the same order,
    ///   and hold as many H draws as H2 draws.
    pub fn bootstrap_replicates(&self, archive: &H2Archive) -> StatsResult<Vec<Self>> {
        if archive.pair_ids != self.ids {
            return Err(StatsError::InvalidShape {
                reason: "bootstrap archive describes different sample pairs".to_string(),
            });
        }
        let n_bins = self.n_bins();
        let (_, _, archive_bins) = archive.h2_dist.dim();
        if archive_bins != n_bins {
            return Err(StatsError::DimensionMismatch {
                what: "bootstrap bins",
                expected: n_bins,
                found: archive_bins,
            });
        }
        let n_iters = archive.h2_dist.len_of(Axis(0));
        if archive.h_dist.nrows() != n_iters {
            return Err(StatsError::DimensionMismatch {
                what: "bootstrap H replicates",
                expected: n_iters,
                found: archive.h_dist.nrows(),
            });
        }
        archive
            .h2_dist
            .outer_iter()
            .zip(archive.h_dist.outer_iter())
            .map(|(h2, h)| {
                let mut arr = Array2::<f64>::zeros((self.n_rows(), self.n_pairs()));
                arr.slice_mut(s![..n_bins, ..]).assign(&h2.t());
                if self.has_h {
                    arr.row_mut(n_bins).assign(&h);
                }
                self.with_values(arr)
            })
            .collect()
    }
}

// ---- Access ----

impl H2Spectrum {
    pub fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    pub fn ids(&self) -> &[(String, String)] {
        &self.ids
    }

    pub fn r_bins(&self) -> &Array1<f64> {
        &self.r_bins
    }

    pub fn arr(&self) -> &Array2<f64> {
        &self.arr
    }

    pub fn covs(&self) -> Option<&Array3<f64>> {
        self.covs.as_ref()
    }

    pub fn has_h(&self) -> bool {
        self.has_h
    }

    pub fn n_bins(&self) -> usize {
        self.r_bins.len() - 1
    }

    pub fn n_pairs(&self) -> usize {
        self.ids.len()
    }

    pub fn n_rows(&self) -> usize {
        self.arr.nrows()
    }

    /// The one-locus H row.
    pub fn h(&self) -> StatsResult<ArrayView1<'_, f64>> {
        if self.has_h {
            Ok(self.arr.row(self.n_bins()))
        } else {
            Err(StatsError::NoH)
        }
    }
}
