//! spectra::sfs — joint allele-frequency spectra and their Poisson likelihood.
//!
//! Purpose
//! -------
//! Hold an n-dimensional site-frequency spectrum with one axis per
//! population, marginalize populations away, and score a model spectrum
//! against data with the Poisson composite log-likelihood.
//!
//! Key behaviors
//! -------------
//! - Axis `i` has length `sample_size_i + 1`.
//! - The likelihood skips the all-ancestral and all-derived corners and
//!   entries whose expectation is not strictly positive; masked interior
//!   entries are reported once per call at `warn` level.
//! - Archives (`samples`, `n_sites`, `sfs`) are JSON.
use crate::graph::demes::DemeGraph;
use crate::spectra::errors::{StatsError, StatsResult};
use ndarray::{ArrayD, Axis, Dimension};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use std::{fs::File, io::BufReader, path::Path};

#[derive(Debug, Clone, PartialEq)]
pub struct Sfs {
    data: ArrayD<f64>,
    pop_ids: Vec<String>,
}

impl Sfs {
    /// Validated spectrum: one axis per population, each of length `>= 2`.
    pub fn new(data: ArrayD<f64>, pop_ids: Vec<String>) -> StatsResult<Self> {
        if data.ndim() != pop_ids.len() {
            return Err(StatsError::DimensionMismatch {
                what: "SFS axes",
                expected: pop_ids.len(),
                found: data.ndim(),
            });
        }
        if pop_ids.is_empty() || data.shape().iter().any(|&n| n < 2) {
            return Err(StatsError::InvalidShape {
                reason: format!("SFS shape {:?} needs every axis >= 2", data.shape()),
            });
        }
        Ok(Self { data, pop_ids })
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn pop_ids(&self) -> &[String] {
        &self.pop_ids
    }

    /// Haploid sample size per population (axis length minus one).
    pub fn sample_sizes(&self) -> Vec<usize> {
        self.data.shape().iter().map(|n| n - 1).collect()
    }

    pub fn pop_index(&self, name: &str) -> Option<usize> {
        self.pop_ids.iter().position(|p| p == name)
    }

    /// Spectrum with every entry multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self { data: &self.data * factor, pop_ids: self.pop_ids.clone() }
    }

    /// Sum out the populations on `axes`.
    ///
    /// Errors
    /// ------
    /// - [`StatsError::InvalidShape`] if an axis is out of range or every
    ///   axis would be removed.
    pub fn marginalize(&self, axes: &[usize]) -> StatsResult<Self> {
        let mut axes: Vec<usize> = axes.to_vec();
        axes.sort_unstable();
        axes.dedup();
        if axes.iter().any(|&a| a >= self.data.ndim()) || axes.len() >= self.data.ndim() {
            return Err(StatsError::InvalidShape {
                reason: format!("cannot marginalize axes {axes:?} of a {}-d SFS", self.data.ndim()),
            });
        }
        let mut data = self.data.clone();
        let mut pop_ids = self.pop_ids.clone();
        for &axis in axes.iter().rev() {
            data = data.sum_axis(Axis(axis));
            pop_ids.remove(axis);
        }
        Self::new(data, pop_ids)
    }
}

/// Poisson composite log-likelihood of `data` given expected counts `model`.
///
/// `Σ −m + d·ln m − lnΓ(d + 1)` over all entries except the two corners and
/// entries with `m <= 0` (or non-finite `m`).
///
/// Errors
/// ------
/// - [`StatsError::InvalidShape`] when the shapes differ.
pub fn sfs_log_likelihood(model: &Sfs, data: &Sfs) -> StatsResult<f64> {
    if model.data.shape() != data.data.shape() {
        return Err(StatsError::InvalidShape {
            reason: format!(
                "model SFS shape {:?} differs from data shape {:?}",
                model.data.shape(),
                data.data.shape()
            ),
        });
    }
    let last: Vec<usize> = data.data.shape().iter().map(|n| n - 1).collect();
    let mut ll = 0.0;
    let mut masked = 0usize;
    for ((idx, &m), &d) in model.data.indexed_iter().zip(data.data.iter()) {
        let idx = idx.slice();
        if idx.iter().all(|&i| i == 0) || idx == last.as_slice() {
            continue;
        }
        if !(m.is_finite() && m > 0.0) {
            masked += 1;
            continue;
        }
        ll += -m + d * m.ln() - ln_gamma(d + 1.0);
    }
    if masked > 0 {
        log::warn!("masked {masked} SFS entries with non-positive expectation");
    }
    Ok(ll)
}

// ---- Archive ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SfsArchive {
    pub samples: Vec<String>,
    pub n_sites: f64,
    pub sfs: ArrayD<f64>,
}

/// Which populations [`read_sfs`] keeps.
#[derive(Debug, Clone, Copy)]
pub enum SfsSelection<'a> {
    All,
    Pops(&'a [String]),
    /// The demes of the graph that were sampled, in graph order.
    Graph(&'a DemeGraph),
}

impl SfsArchive {
    pub fn save(&self, path: &Path) -> StatsResult<()> {
        let file = File::create(path).map_err(|e| StatsError::io(path, e))?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: &Path) -> StatsResult<Self> {
        let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// The stored spectrum restricted to `selection`, with `n_sites`.
    pub fn select(&self, selection: SfsSelection<'_>) -> StatsResult<(Sfs, f64)> {
        let full = Sfs::new(self.sfs.clone(), self.samples.clone())?;
        let keep: Vec<String> = match selection {
            SfsSelection::All => return Ok((full, self.n_sites)),
            SfsSelection::Pops(pops) => {
                if let Some(missing) = pops.iter().find(|p| !self.samples.contains(p)) {
                    return Err(StatsError::UnknownSample { name: missing.clone() });
                }
                pops.to_vec()
            }
            SfsSelection::Graph(graph) => graph
                .deme_names()
                .into_iter()
                .filter(|d| self.samples.iter().any(|s| s == *d))
                .map(str::to_string)
                .collect(),
        };
        let not_sampled: Vec<usize> =
            (0..self.samples.len()).filter(|&i| !keep.contains(&self.samples[i])).collect();
        Ok((full.marginalize(&not_sampled)?, self.n_sites))
    }
}

/// Load an SFS archive and keep the requested populations.
pub fn read_sfs(path: &Path, selection: SfsSelection<'_>) -> StatsResult<(Sfs, f64)> {
    SfsArchive::load(path)?.select(selection)
}
