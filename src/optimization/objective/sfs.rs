//! objective::sfs — Poisson SFS objective.
use crate::model::{sample_times, SfsEvaluator};
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::types::Theta,
    objective::{problem::FitProblem, Objective, OUT_OF_BOUNDS_PENALTY},
};
use crate::spectra::sfs::{sfs_log_likelihood, Sfs};

/// How the expected SFS is scaled to the number of sites in the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SfsScaling {
    /// Fixed `uL`: mutation rate times sequence length.
    Fixed { u_l: f64 },
    /// `u × L`, with `u` fixed or fit and `L` the sequence length.
    PerSite { length: f64 },
}

pub struct SfsObjective<'a, E: SfsEvaluator + ?Sized> {
    problem: FitProblem<'a>,
    evaluator: &'a E,
    data: &'a Sfs,
    scaling: SfsScaling,
    u: Option<f64>,
}

impl<'a, E: SfsEvaluator + ?Sized> SfsObjective<'a, E> {
    /// Errors
    /// ------
    /// - [`OptError::MissingMutationRate`] for per-site scaling when `u` is
    ///   neither fixed nor fit.
    pub fn new(
        problem: FitProblem<'a>, evaluator: &'a E, data: &'a Sfs, scaling: SfsScaling,
        u: Option<f64>,
    ) -> OptResult<Self> {
        if matches!(scaling, SfsScaling::PerSite { .. }) && !problem.fit_u() && u.is_none() {
            return Err(OptError::MissingMutationRate);
        }
        Ok(Self { problem, evaluator, data, scaling, u })
    }

    pub fn problem(&self) -> &FitProblem<'a> {
        &self.problem
    }
}

impl<'a, E: SfsEvaluator + ?Sized> Objective for SfsObjective<'a, E> {
    fn name(&self) -> &str {
        "objective_SFS"
    }

    fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
        let candidate = match self.problem.prepare(theta)? {
            Some(candidate) => candidate,
            None => return Ok(OUT_OF_BOUNDS_PENALTY),
        };
        let theta_ul = match self.scaling {
            SfsScaling::Fixed { u_l } => u_l,
            SfsScaling::PerSite { length } => {
                candidate.u.or(self.u).ok_or(OptError::MissingMutationRate)? * length
            }
        };
        let pop_ids = self.data.pop_ids();
        let times = sample_times(&candidate.graph, pop_ids)?;
        let model = self.evaluator.expected_sfs(
            &candidate.graph,
            pop_ids,
            &self.data.sample_sizes(),
            &times,
            theta_ul,
        )?;
        let ll = sfs_log_likelihood(&model, self.data)?;
        self.problem.report(candidate.call, ll, theta);
        Ok(-ll)
    }
}
