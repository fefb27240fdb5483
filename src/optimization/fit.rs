//! optimization::fit — end-to-end fit drivers.
//!
//! Purpose
//! -------
//! Turn a graph document, an options document, data, and a model evaluator
//! into a fitted, annotated graph: load parameters, bounds, and
//! constraints; add `u` as a free parameter when it is not fixed; build the
//! objective; dispatch to the chosen minimizer; rebuild the graph with the
//! optimum and its `opt_info`.
//!
//! Key behaviors
//! -------------
//! - [`fit_h2`] fits H2 statistics, with the H row when `use_h` is set.
//! - [`fit_sfs`] fits an SFS with either a fixed `uL` or a sequence length
//!   `L` and a free `u`.
//! - [`fit_composite`] fits SFS and H2 (without H) jointly; `L` is required.
//! - Every driver logs the start line (parameter names and `p0`) before the
//!   first evaluation.
//!
//! Conventions
//! -----------
//! - A free `u` starts at [`INIT_U`](crate::params::set::INIT_U) within
//!   `[LOWER_U, UPPER_U]` and is reported in `opt_info.u`, not among the
//!   graph parameters.
use std::path::Path;

use crate::graph::{builder::GraphBuilder, demes::DemeGraph};
use crate::model::{H2Evaluator, SfsEvaluator};
use crate::optimization::{
    context::OptimizationContext,
    errors::{OptError, OptResult},
    minimizer::{optimize, Method, MutationRate, OptimizeOptions},
    objective::{CompositeObjective, FitProblem, H2Objective, SfsObjective, SfsScaling},
};
use crate::params::{constraints::ConstraintSet, options::ParameterOptions, set::ParameterSet};
use crate::spectra::{h2::H2Spectrum, sfs::Sfs};
use crate::utils::{log_start, PROGRESS_TARGET};

/// Driver-level configuration.
///
/// Fields:
/// - `method` — minimization method.
/// - `max_iter` — iteration budget (`> 0`).
/// - `verbosity` — log a progress line every `verbosity` evaluations;
///   `0` disables progress lines.
///
/// Default:
/// - `NelderMead`, `1000` iterations, a progress line on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub method: Method,
    pub max_iter: usize,
    pub verbosity: usize,
}

impl FitOptions {
    /// Errors
    /// ------
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(method: Method, max_iter: usize, verbosity: usize) -> OptResult<Self> {
        OptimizeOptions::new(method, max_iter)?;
        Ok(Self { method, max_iter, verbosity })
    }

    /// Build options from a method name as written in a configuration
    /// file (`"NelderMead"`, `"Powell"`, `"BFGS"`, `"LBFGSB"`).
    ///
    /// Errors
    /// ------
    /// - [`OptError::UnsupportedMethod`] for any other name.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn from_name(method: &str, max_iter: usize, verbosity: usize) -> OptResult<Self> {
        Self::new(method.parse()?, max_iter, verbosity)
    }

    pub fn optimize_options(&self) -> OptimizeOptions {
        OptimizeOptions { method: self.method, max_iter: self.max_iter }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self { method: Method::NelderMead, max_iter: 1000, verbosity: 1 }
    }
}

/// Fit H2 statistics.
///
/// Parameters
/// ----------
/// - `u`: fixed mutation rate; `None` fits it as a free parameter.
/// - `use_h`: keep the H row of `data`; with `false` it is dropped first.
/// - `out`: where to write the fitted graph, if anywhere.
///
/// Returns
/// -------
/// The fitted graph with `opt_info` attached.
///
/// Errors
/// ------
/// - Parameter and constraint errors from the options document.
/// - [`OptError::MissingCovariance`] if `data` has no covariances.
/// - Any solver, objective, or graph error.
#[allow(clippy::too_many_arguments)]
pub fn fit_h2<E: H2Evaluator + ?Sized>(
    builder: &GraphBuilder, options: &ParameterOptions, data: &H2Spectrum, evaluator: &E,
    u: Option<f64>, use_h: bool, fit_options: &FitOptions, out: Option<&Path>,
    ctx: &OptimizationContext,
) -> OptResult<DemeGraph> {
    let data = if !use_h && data.has_h() { data.remove_h() } else { data.clone() };
    log::info!(
        target: PROGRESS_TARGET,
        "fitting H2 to data for demes {:?}",
        data.sample_ids()
    );
    let rate = MutationRate::fixed_or_free(u);
    let problem = setup_problem(builder, options, rate, fit_options, ctx)?;
    let p0 = problem.params().values().clone();
    let bounds = problem.params().bounds();
    let objective = H2Objective::new(problem, evaluator, &data, u)?;
    let fitted = optimize(&objective, p0, &fit_options.optimize_options(), &bounds, rate, ctx)?;
    fitted.into_graph(builder, options, out)
}

/// Fit an SFS with the Poisson likelihood.
///
/// Parameters
/// ----------
/// - `u_l`: fixed `u × L`; takes precedence over `length`.
/// - `length`: sequence length `L`, used with a free `u` when `u_l` is
///   `None`.
///
/// Errors
/// ------
/// - [`OptError::MissingSequenceLength`] if neither `u_l` nor `length` is
///   given.
/// - Any solver, objective, or graph error.
#[allow(clippy::too_many_arguments)]
pub fn fit_sfs<E: SfsEvaluator + ?Sized>(
    builder: &GraphBuilder, options: &ParameterOptions, data: &Sfs, evaluator: &E,
    u_l: Option<f64>, length: Option<f64>, fit_options: &FitOptions, out: Option<&Path>,
    ctx: &OptimizationContext,
) -> OptResult<DemeGraph> {
    let (scaling, rate) = match (u_l, length) {
        (Some(u_l), _) => (SfsScaling::Fixed { u_l }, MutationRate::Unused),
        (None, Some(length)) => (SfsScaling::PerSite { length }, MutationRate::Free),
        (None, None) => {
            return Err(OptError::MissingSequenceLength {
                reason: "Provide either uL or the sequence length L.",
            })
        }
    };
    log::info!(target: PROGRESS_TARGET, "fitting SFS to data for demes {:?}", data.pop_ids());
    let problem = setup_problem(builder, options, rate, fit_options, ctx)?;
    let p0 = problem.params().values().clone();
    let bounds = problem.params().bounds();
    let objective = SfsObjective::new(problem, evaluator, data, scaling, None)?;
    let fitted = optimize(&objective, p0, &fit_options.optimize_options(), &bounds, rate, ctx)?;
    fitted.into_graph(builder, options, out)
}

/// Fit SFS and H2 jointly; the H row of `h2_data` is always dropped.
///
/// Errors
/// ------
/// - [`OptError::MissingSequenceLength`] if `length` is `None`.
/// - Any solver, objective, or graph error.
#[allow(clippy::too_many_arguments)]
pub fn fit_composite<H, S>(
    builder: &GraphBuilder, options: &ParameterOptions, h2_data: &H2Spectrum, sfs_data: &Sfs,
    h2_evaluator: &H, sfs_evaluator: &S, length: Option<f64>, u: Option<f64>,
    fit_options: &FitOptions, out: Option<&Path>, ctx: &OptimizationContext,
) -> OptResult<DemeGraph>
where
    H: H2Evaluator + ?Sized,
    S: SfsEvaluator + ?Sized,
{
    let length = length.ok_or(OptError::MissingSequenceLength {
        reason: "The composite likelihood needs the sequence length L.",
    })?;
    log::info!(
        target: PROGRESS_TARGET,
        "fitting SFS and H2 to data for demes {:?}",
        h2_data.sample_ids()
    );
    let rate = MutationRate::fixed_or_free(u);
    let problem = setup_problem(builder, options, rate, fit_options, ctx)?;
    let p0 = problem.params().values().clone();
    let bounds = problem.params().bounds();
    let objective = CompositeObjective::new(
        problem,
        h2_evaluator,
        sfs_evaluator,
        h2_data,
        sfs_data,
        length,
        u,
    )?;
    let fitted = optimize(&objective, p0, &fit_options.optimize_options(), &bounds, rate, ctx)?;
    fitted.into_graph(builder, options, out)
}

// ---- Helper Methods ----

/// Load the parameter set and constraints, append `u` when it is free, and
/// log the start line.
fn setup_problem<'a>(
    builder: &'a GraphBuilder, options: &'a ParameterOptions, rate: MutationRate,
    fit_options: &FitOptions, ctx: &'a OptimizationContext,
) -> OptResult<FitProblem<'a>> {
    let mut params = ParameterSet::from_builder(builder, options)?;
    let constraints = ConstraintSet::from_options(options, params.names())?;
    if rate.is_free() {
        log::info!(target: PROGRESS_TARGET, "fitting u as a free parameter");
        params = params.with_mutation_rate()?;
    }
    log_start(params.names(), params.values().view());
    let problem = FitProblem::new(builder, options, params, constraints, rate.is_free(), ctx)?;
    Ok(problem.with_verbosity(fit_options.verbosity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::test_support::{
        fixture, AnalyticH2, AnalyticSfs, SEQ_LEN, TRUE_N, TRUE_U,
    };
    use approx::assert_relative_eq;

    // Scope
    // -----
    // - Option validation and configuration errors before any evaluation.
    // - H2 and SFS fits recover the generating sizes from the default start.

    fn sizes(graph: &DemeGraph) -> Vec<f64> {
        graph.deme("A").unwrap().epoch_sizes().unwrap().iter().map(|&(n, _)| n).collect()
    }

    #[test]
    // Purpose
    // -------
    // A zero iteration budget and an unknown method are configuration
    // errors raised before the objective is ever evaluated.
    fn fit_options_reject_bad_configuration() {
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();

        let bad_iter = FitOptions::from_name("powell", 0, 0);
        let bad_method = FitOptions::from_name("BadMethod", 10, 0).and_then(|opts| {
            fit_h2(&fx.builder, &fx.options, &fx.h2_data, &h2, Some(fx.u), true, &opts, None, &ctx)
        });

        assert!(matches!(bad_iter, Err(OptError::InvalidMaxIter { .. })));
        assert!(matches!(bad_method, Err(OptError::UnsupportedMethod { .. })));
        assert_eq!(FitOptions::from_name("L-BFGS-B", 10, 0).unwrap().method, Method::Lbfgsb);
        assert_eq!(h2.calls(), 0);
        assert_eq!(ctx.n_func_calls(), 0);
    }

    #[test]
    // Purpose
    // -------
    // SFS fits need either uL or L; composite fits need L.
    fn missing_sequence_length_is_rejected() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();
        let opts = FitOptions::default();

        // Act
        let sfs = fit_sfs(
            &fx.builder, &fx.options, &fx.sfs_data, &AnalyticSfs, None, None, &opts, None, &ctx,
        );
        let composite = fit_composite(
            &fx.builder,
            &fx.options,
            &fx.h2_data,
            &fx.sfs_data,
            &h2,
            &AnalyticSfs,
            None,
            Some(fx.u),
            &opts,
            None,
            &ctx,
        );

        // Assert
        assert!(matches!(sfs, Err(OptError::MissingSequenceLength { .. })));
        assert!(matches!(composite, Err(OptError::MissingSequenceLength { .. })));
        assert_eq!(h2.calls(), 0);
        assert_eq!(ctx.n_func_calls(), 0);
    }

    #[test]
    // Purpose
    // -------
    // An H2 fit with fixed u recovers both sizes from the graph's start
    // values, and annotates the graph.
    //
    // Given
    // -----
    // - Fixture graph with sizes (10000, 2000) moved to (12000, 2600).
    //
    // Expect
    // ------
    // - Sizes within 1% of the truth; opt_info method and u recorded.
    fn fit_h2_recovers_sizes() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();
        let mut builder = fx.builder.clone();
        fx.options
            .write_values(&mut builder, ndarray::array![12000.0, 2600.0].view())
            .unwrap();
        let opts = FitOptions::new(Method::NelderMead, 2000, 0).unwrap();

        // Act
        let graph = fit_h2(
            &builder, &fx.options, &fx.h2_data, &h2, Some(fx.u), true, &opts, None, &ctx,
        )
        .unwrap();

        // Assert
        let fitted = sizes(&graph);
        assert_relative_eq!(fitted[0], TRUE_N[0], max_relative = 1e-2);
        assert_relative_eq!(fitted[1], TRUE_N[1], max_relative = 1e-2);
        let info = graph.opt_info().unwrap().unwrap();
        assert_eq!(info.method, "NelderMead");
        assert_eq!(info.objective_func, "objective_H2");
        assert_eq!(info.u, Some(fx.u));
        assert_eq!(ctx.n_func_calls(), 0);
    }

    #[test]
    // Purpose
    // -------
    // An SFS fit with fixed uL leaves u out of the provenance.
    fn fit_sfs_with_fixed_ul_records_no_u() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let opts = FitOptions::new(Method::NelderMead, 500, 0).unwrap();

        // Act
        let graph = fit_sfs(
            &fx.builder,
            &fx.options,
            &fx.sfs_data,
            &AnalyticSfs,
            Some(TRUE_U * SEQ_LEN),
            None,
            &opts,
            None,
            &ctx,
        )
        .unwrap();

        // Assert
        let info = graph.opt_info().unwrap().unwrap();
        assert_eq!(info.objective_func, "objective_SFS");
        assert_eq!(info.u, None);
        assert!(info.fopt.is_finite());
    }
}
