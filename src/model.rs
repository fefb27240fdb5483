//! model — the bridge to external expected-statistic evaluators.
//!
//! Purpose
//! -------
//! Define the seams through which the inference core obtains expected
//! statistics for a demographic graph. The coalescent / two-locus
//! machinery lives outside this crate; anything implementing these traits
//! (including plain closures) can drive the objectives.
//!
//! Conventions
//! -----------
//! - H2 expectations are returned already shaped as an [`H2Spectrum`] for
//!   the requested samples and bins, with the H row present iff `get_h`.
//! - SFS expectations are per-site (or per unit of `theta_ul`, see below);
//!   objectives apply sequence-length scaling themselves.
//! - Evaluators report failures as [`StatsError::Evaluator`].
use crate::graph::demes::DemeGraph;
use crate::spectra::{
    errors::{StatsError, StatsResult},
    h2::H2Spectrum,
    sfs::Sfs,
};
use ndarray::ArrayView1;

/// Expected two-locus heterozygosity under a graph.
pub trait H2Evaluator {
    fn expected_h2(
        &self, graph: &DemeGraph, sample_ids: &[String], r_bins: ArrayView1<f64>, u: f64,
        get_h: bool,
    ) -> StatsResult<H2Spectrum>;
}

/// Expected site-frequency spectrum under a graph.
pub trait SfsEvaluator {
    /// Parameters
    /// ----------
    /// - `pop_ids`: sampled demes, one SFS axis each.
    /// - `sample_sizes`: haploid sample size per sampled deme.
    /// - `sample_times`: sampling time per deme (its end time in the graph).
    /// - `theta_ul`: population-scaled mutation rate per site times the
    ///   sequence length, i.e. the total scaling of the spectrum.
    fn expected_sfs(
        &self, graph: &DemeGraph, pop_ids: &[String], sample_sizes: &[usize],
        sample_times: &[f64], theta_ul: f64,
    ) -> StatsResult<Sfs>;
}

impl<F> H2Evaluator for F
where
    F: Fn(&DemeGraph, &[String], ArrayView1<f64>, f64, bool) -> StatsResult<H2Spectrum>,
{
    fn expected_h2(
        &self, graph: &DemeGraph, sample_ids: &[String], r_bins: ArrayView1<f64>, u: f64,
        get_h: bool,
    ) -> StatsResult<H2Spectrum> {
        self(graph, sample_ids, r_bins, u, get_h)
    }
}

impl<F> SfsEvaluator for F
where
    F: Fn(&DemeGraph, &[String], &[usize], &[f64], f64) -> StatsResult<Sfs>,
{
    fn expected_sfs(
        &self, graph: &DemeGraph, pop_ids: &[String], sample_sizes: &[usize],
        sample_times: &[f64], theta_ul: f64,
    ) -> StatsResult<Sfs> {
        self(graph, pop_ids, sample_sizes, sample_times, theta_ul)
    }
}

/// Sampling times of `pop_ids` in `graph` (each deme's last end time).
///
/// Errors
/// ------
/// - [`StatsError::UnknownSample`] when a population is not a deme.
pub fn sample_times(graph: &DemeGraph, pop_ids: &[String]) -> StatsResult<Vec<f64>> {
    pop_ids
        .iter()
        .map(|p| {
            graph
                .deme(p)
                .map(|d| d.end_time())
                .ok_or_else(|| StatsError::UnknownSample { name: p.clone() })
        })
        .collect()
}

/// Wrap any displayable evaluator failure.
pub fn evaluator_error(err: impl std::fmt::Display) -> StatsError {
    StatsError::Evaluator { text: err.to_string() }
}
