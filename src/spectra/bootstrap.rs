//! spectra::bootstrap — windowed counts and the H/H2 block bootstrap.
//!
//! Purpose
//! -------
//! Pool per-window site counts and heterozygosity counts from one or more
//! genomic blocks, resample windows with replacement, and summarize the
//! resulting distributions of H and H2 as means and unbiased covariances.
//!
//! Key behaviors
//! -------------
//! - Each iteration draws `n_windows` window indices uniformly with
//!   replacement from the pooled windows.
//! - `H = Σ h_counts / Σ n_sites` per pair; `H2 = Σ h2_counts / Σ n_site_pairs`
//!   per pair and bin.
//! - Covariances use the `n - 1` denominator.
//!
//! Conventions
//! -----------
//! - `h2_mean` is stored transposed (`bins × pairs`) to match the row
//!   layout of [`crate::spectra::h2::H2Spectrum`].
//! - Archives are JSON, using ndarray's serde encoding.
use crate::linalg::sample_covariance;
use crate::spectra::{
    errors::{StatsError, StatsResult},
    h2::pair_ids,
};
use ndarray::{concatenate, Array1, Array2, Array3, ArrayView, Axis, Dimension, RemoveAxis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Per-window counts for one genomic block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowCounts {
    pub pair_ids: Vec<(String, String)>,
    pub r_bins: Array1<f64>,
    /// `windows`
    pub n_sites: Array1<f64>,
    /// `windows × pairs`
    pub h_counts: Array2<f64>,
    /// `windows × bins`
    pub n_site_pairs: Array2<f64>,
    /// `windows × pairs × bins`
    pub h2_counts: Array3<f64>,
}

/// Bootstrap distributions and their summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct H2Archive {
    pub sample_ids: Vec<String>,
    pub pair_ids: Vec<(String, String)>,
    pub r_bins: Array1<f64>,
    /// `iters × pairs`
    pub h_dist: Array2<f64>,
    pub h_mean: Array1<f64>,
    pub h_cov: Array2<f64>,
    /// `iters × pairs × bins`
    pub h2_dist: Array3<f64>,
    /// `bins × pairs`
    pub h2_mean: Array2<f64>,
    /// `bins × pairs × pairs`
    pub h2_cov: Array3<f64>,
}

impl WindowCounts {
    /// Validated counts.
    ///
    /// Errors
    /// ------
    /// - [`StatsError::InvalidShape`] when the arrays disagree on the number
    ///   of windows, pairs, or bins.
    pub fn new(
        pair_ids: Vec<(String, String)>, r_bins: Array1<f64>, n_sites: Array1<f64>,
        h_counts: Array2<f64>, n_site_pairs: Array2<f64>, h2_counts: Array3<f64>,
    ) -> StatsResult<Self> {
        let counts = Self { pair_ids, r_bins, n_sites, h_counts, n_site_pairs, h2_counts };
        counts.validate()?;
        Ok(counts)
    }

    pub fn n_windows(&self) -> usize {
        self.n_sites.len()
    }

    fn validate(&self) -> StatsResult<()> {
        if self.r_bins.len() < 2 {
            return Err(StatsError::InvalidShape {
                reason: "need at least two recombination bin edges".to_string(),
            });
        }
        let w = self.n_windows();
        let p = self.pair_ids.len();
        let b = self.r_bins.len() - 1;
        let ok = self.h_counts.dim() == (w, p)
            && self.n_site_pairs.dim() == (w, b)
            && self.h2_counts.dim() == (w, p, b);
        if !ok {
            return Err(StatsError::InvalidShape {
                reason: format!(
                    "window counts must be ({w}), ({w}, {p}), ({w}, {b}), ({w}, {p}, {b})"
                ),
            });
        }
        Ok(())
    }
}

/// Resample windows with replacement `n_iters` times.
///
/// Parameters
/// ----------
/// - `blocks`: window counts, pooled in order; all must share pair ids and
///   bin edges.
/// - `n_iters`: number of bootstrap iterations (at least two).
/// - `rng`: random source.
///
/// Errors
/// ------
/// - [`StatsError::EmptyBootstrap`] with no blocks, no windows, or fewer
///   than two iterations.
/// - [`StatsError::InconsistentBlocks`] when blocks disagree on pair ids or
///   bins, or the pair ids are not the upper triangle of a sample list.
pub fn bootstrap_h2<R: Rng + ?Sized>(
    blocks: &[WindowCounts], n_iters: usize, rng: &mut R,
) -> StatsResult<H2Archive> {
    let first = blocks.first().ok_or(StatsError::EmptyBootstrap)?;
    if n_iters < 2 {
        return Err(StatsError::EmptyBootstrap);
    }
    for block in blocks {
        block.validate()?;
        if block.pair_ids != first.pair_ids || block.r_bins != first.r_bins {
            return Err(StatsError::InconsistentBlocks {
                reason: "pair ids or recombination bins differ between blocks".to_string(),
            });
        }
    }
    let sample_ids = samples_from_pairs(&first.pair_ids)?;

    let n_sites = pool(blocks, |b| b.n_sites.view())?;
    let h_counts = pool(blocks, |b| b.h_counts.view())?;
    let n_site_pairs = pool(blocks, |b| b.n_site_pairs.view())?;
    let h2_counts = pool(blocks, |b| b.h2_counts.view())?;
    let n_windows = n_sites.len();
    if n_windows == 0 {
        return Err(StatsError::EmptyBootstrap);
    }
    let (_, n_pairs, n_bins) = h2_counts.dim();

    let mut h_dist = Array2::<f64>::zeros((n_iters, n_pairs));
    let mut h2_dist = Array3::<f64>::zeros((n_iters, n_pairs, n_bins));
    for i in 0..n_iters {
        let idx: Vec<usize> = (0..n_windows).map(|_| rng.gen_range(0..n_windows)).collect();
        let site_sum = n_sites.select(Axis(0), &idx).sum();
        let h_sum = h_counts.select(Axis(0), &idx).sum_axis(Axis(0));
        h_dist.row_mut(i).assign(&(h_sum / site_sum));

        let pair_sum = n_site_pairs.select(Axis(0), &idx).sum_axis(Axis(0));
        let h2_sum = h2_counts.select(Axis(0), &idx).sum_axis(Axis(0));
        h2_dist.index_axis_mut(Axis(0), i).assign(&(&h2_sum / &pair_sum));
    }

    let h_mean = h_dist.mean_axis(Axis(0)).ok_or(StatsError::EmptyBootstrap)?;
    let h_cov = sample_covariance(h_dist.view());
    let h2_mean = h2_dist.mean_axis(Axis(0)).ok_or(StatsError::EmptyBootstrap)?.reversed_axes();
    let mut h2_cov = Array3::<f64>::zeros((n_bins, n_pairs, n_pairs));
    for k in 0..n_bins {
        h2_cov
            .index_axis_mut(Axis(0), k)
            .assign(&sample_covariance(h2_dist.index_axis(Axis(2), k)));
    }
    log::debug!("bootstrapped {n_iters} iterations over {n_windows} windows");

    Ok(H2Archive {
        sample_ids,
        pair_ids: first.pair_ids.clone(),
        r_bins: first.r_bins.clone(),
        h_dist,
        h_mean,
        h_cov,
        h2_dist,
        h2_mean,
        h2_cov,
    })
}

fn pool<'a, D, F>(blocks: &'a [WindowCounts], get: F) -> StatsResult<ndarray::Array<f64, D>>
where
    D: Dimension + RemoveAxis,
    F: Fn(&'a WindowCounts) -> ArrayView<'a, f64, D>,
{
    let views: Vec<ArrayView<'a, f64, D>> = blocks.iter().map(get).collect();
    concatenate(Axis(0), &views)
        .map_err(|e| StatsError::InconsistentBlocks { reason: e.to_string() })
}

fn samples_from_pairs(pairs: &[(String, String)]) -> StatsResult<Vec<String>> {
    let mut samples: Vec<String> = Vec::new();
    for (a, b) in pairs {
        for name in [a, b] {
            if !samples.contains(name) {
                samples.push(name.clone());
            }
        }
    }
    if pair_ids(&samples) != pairs {
        return Err(StatsError::InconsistentBlocks {
            reason: "pair ids are not all unordered pairs of the samples".to_string(),
        });
    }
    Ok(samples)
}

impl H2Archive {
    pub fn save(&self, path: &Path) -> StatsResult<()> {
        let file = File::create(path).map_err(|e| StatsError::io(path, e))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> StatsResult<Self> {
        let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
        let archive: H2Archive = serde_json::from_reader(BufReader::new(file))?;
        archive.check_pairs()?;
        Ok(archive)
    }

    pub(crate) fn check_pairs(&self) -> StatsResult<()> {
        if pair_ids(&self.sample_ids) != self.pair_ids {
            return Err(StatsError::InconsistentBlocks {
                reason: "archive pair ids do not match its sample ids".to_string(),
            });
        }
        Ok(())
    }
}
