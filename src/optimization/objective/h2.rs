//! objective::h2 — Gaussian H2 objective.
use crate::model::H2Evaluator;
use crate::optimization::{
    errors::{OptError, OptResult},
    likelihood::log_likelihood,
    minimizer::types::Theta,
    objective::{problem::FitProblem, Objective, OUT_OF_BOUNDS_PENALTY},
};
use crate::spectra::h2::H2Spectrum;

/// Negative Gaussian composite log-likelihood of an H2 data spectrum.
///
/// The H row takes part exactly when the data spectrum carries one; fit
/// drivers strip it beforehand when H should be left out.
pub struct H2Objective<'a, E: H2Evaluator + ?Sized> {
    problem: FitProblem<'a>,
    evaluator: &'a E,
    data: &'a H2Spectrum,
    u: Option<f64>,
}

impl<'a, E: H2Evaluator + ?Sized> H2Objective<'a, E> {
    /// Parameters
    /// ----------
    /// - `u`: the fixed mutation rate; ignored when the problem fits `u`.
    ///
    /// Errors
    /// ------
    /// - [`OptError::MissingMutationRate`] if `u` is neither fixed nor fit.
    /// - [`OptError::MissingCovariance`] if `data` has no covariances.
    pub fn new(
        problem: FitProblem<'a>, evaluator: &'a E, data: &'a H2Spectrum, u: Option<f64>,
    ) -> OptResult<Self> {
        if !problem.fit_u() && u.is_none() {
            return Err(OptError::MissingMutationRate);
        }
        if data.covs().is_none() {
            return Err(OptError::MissingCovariance);
        }
        Ok(Self { problem, evaluator, data, u })
    }

    pub fn use_h(&self) -> bool {
        self.data.has_h()
    }

    pub fn problem(&self) -> &FitProblem<'a> {
        &self.problem
    }
}

impl<'a, E: H2Evaluator + ?Sized> Objective for H2Objective<'a, E> {
    fn name(&self) -> &str {
        "objective_H2"
    }

    fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
        let candidate = match self.problem.prepare(theta)? {
            Some(candidate) => candidate,
            None => return Ok(OUT_OF_BOUNDS_PENALTY),
        };
        let u = candidate.u.or(self.u).ok_or(OptError::MissingMutationRate)?;
        let model = H2Spectrum::from_graph(
            self.evaluator,
            &candidate.graph,
            self.data.sample_ids(),
            self.data.r_bins().view(),
            u,
            self.data.has_h(),
        )?;
        let ll = log_likelihood(&model, self.data, &mut self.problem.ctx().inv_cov_cache())?;
        self.problem.report(candidate.call, ll, theta);
        Ok(-ll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::context::OptimizationContext;
    use crate::optimization::test_support::{fixture, AnalyticH2, TRUE_N};
    use approx::assert_relative_eq;
    use ndarray::array;

    // Scope
    // -----
    // - Zero cost at the generating parameters; purity across calls.
    // - Penalty without model evaluation for infeasible points.
    // - Construction errors.

    #[test]
    // Purpose
    // -------
    // Data generated at the true parameters is fit exactly there, and
    // repeated evaluation gives the same value.
    //
    // Expect
    // ------
    // - Cost 0 at the truth, positive elsewhere, identical on repeat.
    // - One counted call per evaluation.
    fn h2_objective_is_zero_at_truth_and_pure() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let evaluator = AnalyticH2::default();
        let problem = fx.problem(&ctx, false);
        let objective = H2Objective::new(problem, &evaluator, &fx.h2_data, Some(fx.u)).unwrap();
        let truth = array![TRUE_N[0], TRUE_N[1]];
        let off = array![TRUE_N[0] * 1.2, TRUE_N[1]];

        // Act
        let at_truth = objective.evaluate(&truth).unwrap();
        let first = objective.evaluate(&off).unwrap();
        let second = objective.evaluate(&off).unwrap();

        // Assert
        assert_relative_eq!(at_truth, 0.0, epsilon = 1e-9);
        assert!(first > 0.0);
        assert_eq!(first, second);
        assert_eq!(ctx.n_func_calls(), 3);
        assert!(objective.use_h());
    }

    #[test]
    // Purpose
    // -------
    // Out-of-bounds points cost the penalty and never call the evaluator.
    fn h2_objective_penalizes_out_of_bounds() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let evaluator = AnalyticH2::default();
        let objective =
            H2Objective::new(fx.problem(&ctx, false), &evaluator, &fx.h2_data, Some(fx.u)).unwrap();

        // Act
        let value = objective.evaluate(&array![50.0, TRUE_N[1]]).unwrap();

        // Assert
        assert_eq!(value, OUT_OF_BOUNDS_PENALTY);
        assert_eq!(evaluator.calls(), 0);
        assert_eq!(ctx.n_func_calls(), 1);
    }

    #[test]
    // Purpose
    // -------
    // With `u` free, the trailing entry is the mutation rate handed to the
    // evaluator.
    fn h2_objective_reads_fitted_u() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let evaluator = AnalyticH2::default();
        let objective =
            H2Objective::new(fx.problem(&ctx, true), &evaluator, &fx.h2_data, None).unwrap();

        // Act
        let value = objective.evaluate(&array![TRUE_N[0], TRUE_N[1], fx.u]).unwrap();

        // Assert
        assert_relative_eq!(value, 0.0, epsilon = 1e-9);
        assert_eq!(evaluator.last_u(), Some(fx.u));
    }

    #[test]
    // Purpose
    // -------
    // A fixed-u objective without a u is rejected at construction.
    fn h2_objective_requires_mutation_rate() {
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let evaluator = AnalyticH2::default();

        let err = H2Objective::new(fx.problem(&ctx, false), &evaluator, &fx.h2_data, None)
            .err()
            .unwrap();

        assert_eq!(err, OptError::MissingMutationRate);
    }
}
