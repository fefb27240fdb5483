//! High-level entry point: minimize an [`Objective`] with the configured
//! [`Method`](super::traits::Method) and package the result with its
//! provenance.
use std::path::Path;

use crate::graph::{builder::GraphBuilder, demes::DemeGraph, provenance::OptimizationProvenance};
use crate::optimization::{
    context::OptimizationContext,
    errors::{OptError, OptResult},
    minimizer::{traits::OptimizeOptions, types::Theta, validation::validate_start},
    objective::Objective,
};
use crate::params::options::ParameterOptions;
use crate::utils::{status_line, PROGRESS_TARGET};
use ndarray::s;

/// How the mutation rate enters a fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MutationRate {
    /// Held fixed; recorded in the provenance.
    Fixed(f64),
    /// Free parameter stored as the last entry of the parameter vector.
    Free,
    /// Not part of the model (e.g. SFS scaled by a fixed `uL`).
    Unused,
}

impl MutationRate {
    /// `Fixed(u)` for `Some(u)`, otherwise `Free`.
    pub fn fixed_or_free(u: Option<f64>) -> Self {
        match u {
            Some(u) => MutationRate::Fixed(u),
            None => MutationRate::Free,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, MutationRate::Free)
    }

    pub fn fixed(&self) -> Option<f64> {
        match self {
            MutationRate::Fixed(u) => Some(*u),
            _ => None,
        }
    }
}

/// Fitted graph parameters and the record of how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimized {
    /// Graph parameters only; a free mutation rate lives in
    /// `provenance.u`.
    pub parameters: Theta,
    pub provenance: OptimizationProvenance,
}

impl Optimized {
    /// Rebuild the graph with the fitted values and attach `opt_info`.
    ///
    /// Parameters
    /// ----------
    /// - `out`: when given, the annotated graph is also written there as
    ///   YAML.
    ///
    /// Errors
    /// ------
    /// - Parameter errors from writing values into the builder.
    /// - Graph errors from building, annotating, or writing the graph.
    pub fn into_graph(
        &self, builder: &GraphBuilder, options: &ParameterOptions, out: Option<&Path>,
    ) -> OptResult<DemeGraph> {
        let mut builder = builder.clone();
        options.write_values(&mut builder, self.parameters.view())?;
        let mut graph = builder.build()?;
        graph.set_opt_info(&self.provenance)?;
        if let Some(path) = out {
            graph.dump(path)?;
            log::info!(target: PROGRESS_TARGET, "wrote fitted graph to {}", path.display());
        }
        Ok(graph)
    }
}

/// Minimize `objective` from `p0` and record provenance.
///
/// Parameters
/// ----------
/// - `bounds`: one `(lower, upper)` pair per entry of `p0`.
/// - `u`: how the mutation rate enters; with [`MutationRate::Free`] the last
///   entry of the optimum is split off into `provenance.u`.
/// - `ctx`: the context the objective counts its calls in; its counter
///   supplies `func_calls` and is reset to zero afterwards, whether the run
///   succeeded or not.
///
/// Returns
/// -------
/// [`Optimized`] with `fopt = −f_opt` (a log-likelihood).
///
/// Errors
/// ------
/// - [`OptError::DimensionMismatch`] if `p0` and `bounds` disagree.
/// - Any solver or objective error.
pub fn optimize<O: Objective>(
    objective: &O, p0: Theta, options: &OptimizeOptions, bounds: &[(f64, f64)], u: MutationRate,
    ctx: &OptimizationContext,
) -> OptResult<Optimized> {
    validate_start(&p0, bounds)?;
    if u.is_free() && p0.is_empty() {
        return Err(OptError::MissingMutationRate);
    }
    log::debug!("minimizing {} with {}", objective.name(), options.method);

    let minimizer = options.method.minimizer();
    let outcome = minimizer.minimize(objective, p0, bounds, options.max_iter);
    let func_calls = ctx.n_func_calls() as u64;
    ctx.reset_calls();
    let outcome = outcome?;

    log::info!(
        target: PROGRESS_TARGET,
        "{}",
        status_line(func_calls as usize, -outcome.f_opt, outcome.theta_hat.view())
    );

    let (parameters, fitted_u) = if u.is_free() {
        let n = outcome.theta_hat.len() - 1;
        (outcome.theta_hat.slice(s![..n]).to_owned(), Some(outcome.theta_hat[n]))
    } else {
        (outcome.theta_hat.clone(), u.fixed())
    };
    let provenance = OptimizationProvenance {
        method: options.method.to_string(),
        objective_func: objective.name().to_string(),
        fopt: -outcome.f_opt,
        max_iter: options.max_iter,
        n_iter: outcome.n_iter,
        func_calls,
        flag: outcome.exit_flag,
        u: fitted_u,
    };
    log::info!(target: PROGRESS_TARGET, "fit finished ({})\n{provenance}", outcome.status);
    Ok(Optimized { parameters, provenance })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::traits::Method;
    use crate::optimization::objective::H2Objective;
    use crate::optimization::test_support::{fixture, AnalyticH2, TRUE_N};
    use crate::params::set::{LOWER_U, UPPER_U};
    use approx::assert_relative_eq;
    use ndarray::array;
    use tempfile::tempdir;

    // Scope
    // -----
    // - Provenance fields and counter reset after a run.
    // - Splitting a free mutation rate off the optimum.
    // - Writing the annotated graph.

    #[test]
    // Purpose
    // -------
    // A fixed-u H2 fit records method, objective, counts and the fixed u,
    // and leaves the context counter at zero.
    //
    // Given
    // -----
    // - Fixture data, NelderMead, start 20% off the truth.
    //
    // Expect
    // ------
    // - Parameters within 1% of the truth, fopt ≈ 0.
    // - func_calls > 0 recorded, counter reset to 0.
    fn optimize_records_provenance_and_resets_counter() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();
        let objective =
            H2Objective::new(fx.problem(&ctx, false), &h2, &fx.h2_data, Some(fx.u)).unwrap();
        let bounds = objective.problem().params().bounds();
        let options = OptimizeOptions::new(Method::NelderMead, 2000).unwrap();
        let p0 = array![TRUE_N[0] * 1.2, TRUE_N[1] * 0.8];

        // Act
        let fitted =
            optimize(&objective, p0, &options, &bounds, MutationRate::Fixed(fx.u), &ctx).unwrap();

        // Assert
        assert_relative_eq!(fitted.parameters[0], TRUE_N[0], max_relative = 1e-2);
        assert_relative_eq!(fitted.parameters[1], TRUE_N[1], max_relative = 1e-2);
        let info = &fitted.provenance;
        assert_eq!(info.method, "NelderMead");
        assert_eq!(info.objective_func, "objective_H2");
        assert_eq!(info.max_iter, 2000);
        assert_eq!(info.u, Some(fx.u));
        assert!(info.func_calls > 0);
        assert!(info.fopt <= 0.0 && info.fopt > -1e-3);
        assert_eq!(ctx.n_func_calls(), 0);
    }

    #[test]
    // Purpose
    // -------
    // With u free, the last entry of the optimum becomes `provenance.u`.
    fn optimize_splits_free_mutation_rate() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();
        let objective = H2Objective::new(fx.problem(&ctx, true), &h2, &fx.h2_data, None).unwrap();
        let bounds = objective.problem().params().bounds();
        let options = OptimizeOptions::new(Method::NelderMead, 5).unwrap();
        let p0 = array![TRUE_N[0], TRUE_N[1], fx.u];

        // Act
        let fitted = optimize(&objective, p0, &options, &bounds, MutationRate::Free, &ctx).unwrap();

        // Assert
        assert_eq!(fitted.parameters.len(), 2);
        let u = fitted.provenance.u.unwrap();
        assert!((LOWER_U..=UPPER_U).contains(&u));
        assert_eq!(fitted.provenance.flag, 1);
    }

    #[test]
    // Purpose
    // -------
    // A start vector that disagrees with the bounds fails before any call.
    fn optimize_rejects_mismatched_start() {
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();
        let objective =
            H2Objective::new(fx.problem(&ctx, false), &h2, &fx.h2_data, Some(fx.u)).unwrap();

        let err = optimize(
            &objective,
            array![1.0],
            &OptimizeOptions::default(),
            &[(0.0, 2.0), (0.0, 2.0)],
            MutationRate::Fixed(fx.u),
            &ctx,
        )
        .unwrap_err();

        assert!(matches!(err, OptError::DimensionMismatch { .. }));
        assert_eq!(h2.calls(), 0);
    }

    #[test]
    // Purpose
    // -------
    // The annotated graph carries the fitted values and provenance, and is
    // written when a path is given.
    fn into_graph_writes_annotated_graph() {
        // Arrange
        let fx = fixture();
        let dir = tempdir().unwrap();
        let path = dir.path().join("fit.yaml");
        let fitted = Optimized {
            parameters: array![12000.0, 1500.0],
            provenance: OptimizationProvenance {
                method: "Powell".to_string(),
                objective_func: "objective_H2".to_string(),
                fopt: -12.5,
                max_iter: 100,
                n_iter: 7,
                func_calls: 90,
                flag: 0,
                u: Some(1.4e-8),
            },
        };

        // Act
        let graph = fitted.into_graph(&fx.builder, &fx.options, Some(&path)).unwrap();
        let reloaded = DemeGraph::load(&path).unwrap();

        // Assert
        let sizes = graph.deme("A").unwrap().epoch_sizes().unwrap();
        assert_eq!(sizes[0].0, 12000.0);
        assert_eq!(sizes[1].0, 1500.0);
        assert_eq!(reloaded.opt_info().unwrap(), Some(fitted.provenance.clone()));
    }
}
