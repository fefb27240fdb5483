//! objective::composite — joint SFS and H2 objective.
use crate::model::{sample_times, H2Evaluator, SfsEvaluator};
use crate::optimization::{
    errors::{OptError, OptResult},
    likelihood::log_likelihood,
    minimizer::types::Theta,
    objective::{problem::FitProblem, Objective, OUT_OF_BOUNDS_PENALTY},
};
use crate::spectra::{
    h2::H2Spectrum,
    sfs::{sfs_log_likelihood, Sfs},
};

/// Sum of the Poisson SFS log-likelihood (scaled by `u × L`) and the
/// Gaussian H2 log-likelihood without the H row.
pub struct CompositeObjective<'a, H, S>
where
    H: H2Evaluator + ?Sized,
    S: SfsEvaluator + ?Sized,
{
    problem: FitProblem<'a>,
    h2_evaluator: &'a H,
    sfs_evaluator: &'a S,
    h2_data: H2Spectrum,
    sfs_data: &'a Sfs,
    length: f64,
    u: Option<f64>,
}

impl<'a, H, S> CompositeObjective<'a, H, S>
where
    H: H2Evaluator + ?Sized,
    S: SfsEvaluator + ?Sized,
{
    /// The H row of `h2_data` is dropped if present.
    ///
    /// Errors
    /// ------
    /// - [`OptError::MissingMutationRate`] if `u` is neither fixed nor fit.
    /// - [`OptError::MissingCovariance`] if `h2_data` has no covariances.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        problem: FitProblem<'a>, h2_evaluator: &'a H, sfs_evaluator: &'a S, h2_data: &H2Spectrum,
        sfs_data: &'a Sfs, length: f64, u: Option<f64>,
    ) -> OptResult<Self> {
        if !problem.fit_u() && u.is_none() {
            return Err(OptError::MissingMutationRate);
        }
        if h2_data.covs().is_none() {
            return Err(OptError::MissingCovariance);
        }
        Ok(Self {
            problem,
            h2_evaluator,
            sfs_evaluator,
            h2_data: h2_data.remove_h(),
            sfs_data,
            length,
            u,
        })
    }

    pub fn problem(&self) -> &FitProblem<'a> {
        &self.problem
    }
}

impl<'a, H, S> Objective for CompositeObjective<'a, H, S>
where
    H: H2Evaluator + ?Sized,
    S: SfsEvaluator + ?Sized,
{
    fn name(&self) -> &str {
        "objective_composite"
    }

    fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
        let candidate = match self.problem.prepare(theta)? {
            Some(candidate) => candidate,
            None => return Ok(OUT_OF_BOUNDS_PENALTY),
        };
        let u = candidate.u.or(self.u).ok_or(OptError::MissingMutationRate)?;

        let pop_ids = self.sfs_data.pop_ids();
        let times = sample_times(&candidate.graph, pop_ids)?;
        let sfs_model = self.sfs_evaluator.expected_sfs(
            &candidate.graph,
            pop_ids,
            &self.sfs_data.sample_sizes(),
            &times,
            u * self.length,
        )?;
        let h2_model = H2Spectrum::from_graph(
            self.h2_evaluator,
            &candidate.graph,
            self.h2_data.sample_ids(),
            self.h2_data.r_bins().view(),
            u,
            false,
        )?;

        let ll = sfs_log_likelihood(&sfs_model, self.sfs_data)?
            + log_likelihood(&h2_model, &self.h2_data, &mut self.problem.ctx().inv_cov_cache())?;
        self.problem.report(candidate.call, ll, theta);
        Ok(-ll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::context::OptimizationContext;
    use crate::optimization::objective::{H2Objective, SfsObjective, SfsScaling};
    use crate::optimization::test_support::{fixture, AnalyticH2, AnalyticSfs, SEQ_LEN, TRUE_N};
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // The composite cost is the SFS cost plus the H2 cost without H.
    //
    // Given
    // -----
    // - The fixture data at a perturbed point, u fixed.
    //
    // Expect
    // ------
    // - composite = sfs(u × L) + h2(no H).
    fn composite_is_sum_of_parts() {
        // Arrange
        let fx = fixture();
        let ctx = OptimizationContext::new();
        let h2 = AnalyticH2::default();
        let no_h = fx.h2_data.remove_h();
        let theta = array![TRUE_N[0] * 1.1, TRUE_N[1] * 0.9];
        let composite = CompositeObjective::new(
            fx.problem(&ctx, false),
            &h2,
            &AnalyticSfs,
            &fx.h2_data,
            &fx.sfs_data,
            SEQ_LEN,
            Some(fx.u),
        )
        .unwrap();
        let sfs_only = SfsObjective::new(
            fx.problem(&ctx, false),
            &AnalyticSfs,
            &fx.sfs_data,
            SfsScaling::PerSite { length: SEQ_LEN },
            Some(fx.u),
        )
        .unwrap();
        let h2_only = H2Objective::new(fx.problem(&ctx, false), &h2, &no_h, Some(fx.u)).unwrap();

        // Act
        let total = composite.evaluate(&theta).unwrap();
        let parts = sfs_only.evaluate(&theta).unwrap() + h2_only.evaluate(&theta).unwrap();

        // Assert
        assert_relative_eq!(total, parts, max_relative = 1e-12);
    }
}
