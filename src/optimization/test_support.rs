//! Shared fixtures for optimization and inference unit tests: a one-deme,
//! two-epoch graph and closed-form H2 / SFS evaluators.
use crate::graph::{builder::GraphBuilder, demes::DemeGraph};
use crate::model::{evaluator_error, H2Evaluator, SfsEvaluator};
use crate::optimization::{context::OptimizationContext, objective::FitProblem};
use crate::params::{constraints::ConstraintSet, options::ParameterOptions, set::ParameterSet};
use crate::spectra::{errors::StatsResult, h2::H2Spectrum, sfs::Sfs};
use ndarray::{array, Array1, Array2, Array3, ArrayD, ArrayView1, IxDyn};
use std::cell::Cell;

pub const GRAPH: &str = "
time_units: generations
demes:
  - name: A
    epochs:
      - start_size: 10000
        end_time: 1000
      - start_size: 2000
        end_time: 0
";

pub const OPTIONS: &str = "
parameters:
  - name: N_anc
    path: demes.A.epochs.0.start_size
    lower_bound: 100
    upper_bound: 100000
  - name: N_recent
    path: demes.A.epochs.1.start_size
    lower_bound: 100
    upper_bound: 100000
";

/// Sizes used to generate the fixture data.
pub const TRUE_N: [f64; 2] = [10000.0, 2000.0];
pub const TRUE_U: f64 = 1.5e-8;
pub const SEQ_LEN: f64 = 1e6;

pub fn r_bins() -> Array1<f64> {
    array![1e-6, 1e-5, 1e-4, 1e-3, 1e-2]
}

fn sizes(graph: &DemeGraph) -> StatsResult<(f64, f64)> {
    let deme = graph.deme("A").ok_or_else(|| evaluator_error("no deme A"))?;
    let epochs = deme.epoch_sizes().map_err(evaluator_error)?;
    match epochs.as_slice() {
        [(n_anc, _), (n_recent, _)] => Ok((*n_anc, *n_recent)),
        _ => Err(evaluator_error("expected two epochs")),
    }
}

/// H = 4uN_anc; H2(r) = H² + (4uN_recent)² / (1 + 4N_recent r) at bin
/// midpoints.
#[derive(Debug, Default)]
pub struct AnalyticH2 {
    calls: Cell<usize>,
    last_u: Cell<Option<f64>>,
}

impl AnalyticH2 {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_u(&self) -> Option<f64> {
        self.last_u.get()
    }
}

pub fn analytic_h2_rows(
    n_anc: f64, n_recent: f64, u: f64, r_bins: ArrayView1<f64>, get_h: bool,
) -> Array2<f64> {
    let h = 4.0 * u * n_anc;
    let theta_r = 4.0 * u * n_recent;
    let mut rows: Vec<f64> = (0..r_bins.len() - 1)
        .map(|i| {
            let r = 0.5 * (r_bins[i] + r_bins[i + 1]);
            h * h + theta_r * theta_r / (1.0 + 4.0 * n_recent * r)
        })
        .collect();
    if get_h {
        rows.push(h);
    }
    let n = rows.len();
    Array2::from_shape_vec((n, 1), rows).unwrap_or_else(|_| Array2::zeros((n, 1)))
}

impl H2Evaluator for AnalyticH2 {
    fn expected_h2(
        &self, graph: &DemeGraph, sample_ids: &[String], r_bins: ArrayView1<f64>, u: f64,
        get_h: bool,
    ) -> StatsResult<H2Spectrum> {
        self.calls.set(self.calls.get() + 1);
        self.last_u.set(Some(u));
        let (n_anc, n_recent) = sizes(graph)?;
        let arr = analytic_h2_rows(n_anc, n_recent, u, r_bins, get_h);
        H2Spectrum::new(sample_ids.to_vec(), r_bins.to_owned(), arr, None, get_h)
    }
}

/// One-population SFS with `m_i = θ (4N_anc / i + 4N_recent)` for interior
/// entries and zero corners.
#[derive(Debug, Default)]
pub struct AnalyticSfs;

impl SfsEvaluator for AnalyticSfs {
    fn expected_sfs(
        &self, graph: &DemeGraph, pop_ids: &[String], sample_sizes: &[usize],
        _sample_times: &[f64], theta_ul: f64,
    ) -> StatsResult<Sfs> {
        let (n_anc, n_recent) = sizes(graph)?;
        let n = sample_sizes[0];
        let data: Vec<f64> = (0..=n)
            .map(|i| {
                if i == 0 || i == n {
                    0.0
                } else {
                    theta_ul * (4.0 * n_anc / i as f64 + 4.0 * n_recent)
                }
            })
            .collect();
        let arr = ArrayD::from_shape_vec(IxDyn(&[n + 1]), data).map_err(evaluator_error)?;
        Sfs::new(arr, pop_ids.to_vec())
    }
}

pub struct Fixture {
    pub builder: GraphBuilder,
    pub options: ParameterOptions,
    pub h2_data: H2Spectrum,
    pub sfs_data: Sfs,
    pub u: f64,
}

impl Fixture {
    pub fn problem<'a>(&'a self, ctx: &'a OptimizationContext, fit_u: bool) -> FitProblem<'a> {
        let mut params = ParameterSet::from_builder(&self.builder, &self.options).unwrap();
        if fit_u {
            params = params.with_mutation_rate().unwrap();
        }
        FitProblem::new(&self.builder, &self.options, params, ConstraintSet::new(), fit_u, ctx)
            .unwrap()
    }
}

/// Data generated at [`TRUE_N`] and [`TRUE_U`], H row included, with 1%
/// standard deviations on the diagonal.
pub fn fixture() -> Fixture {
    let builder = GraphBuilder::from_yaml_str(GRAPH).unwrap();
    let options = ParameterOptions::from_yaml_str(OPTIONS).unwrap();
    let bins = r_bins();
    let arr = analytic_h2_rows(TRUE_N[0], TRUE_N[1], TRUE_U, bins.view(), true);
    let mut covs = Array3::zeros((arr.nrows(), 1, 1));
    for (i, &x) in arr.column(0).iter().enumerate() {
        covs[[i, 0, 0]] = (0.01 * x).powi(2);
    }
    let h2_data = H2Spectrum::new(vec!["A".to_string()], bins, arr, Some(covs), true).unwrap();
    let graph = builder.build().unwrap();
    let sfs_data = AnalyticSfs
        .expected_sfs(&graph, &["A".to_string()], &[4], &[0.0], TRUE_U * SEQ_LEN)
        .unwrap();
    Fixture { builder, options, h2_data, sfs_data, u: TRUE_U }
}
