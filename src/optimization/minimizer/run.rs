//! Execution helpers: one [`Minimizer`] per [`Method`], each running an
//! `argmin` executor and normalizing its final state into a
//! [`MinimizerOutcome`].
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        adapter::{bound_scales, clamp_to_bounds, ArgMinAdapter, ProjectedAdapter},
        builders::{build_bfgs, build_lbfgsb, build_nelder_mead, build_powell},
        traits::{Method, Minimizer, MinimizerOutcome},
        types::{Cost, Hessian, Theta},
    },
    objective::Objective,
};
use argmin::core::{Executor, State};

/// Nelder–Mead from the simplex around `p0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NelderMeadMinimizer;

/// Powell's direction-set method.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowellMinimizer;

/// BFGS with central-difference gradients; `n_iter` reports gradient
/// evaluations.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfgsMinimizer;

/// Bounded L-BFGS on box-scaled coordinates with projected
/// finite-difference gradients.
#[derive(Debug, Clone, Copy, Default)]
pub struct LbfgsbMinimizer;

impl Method {
    /// The minimizer implementing this method.
    pub fn minimizer(self) -> Box<dyn Minimizer> {
        match self {
            Method::NelderMead => Box::new(NelderMeadMinimizer),
            Method::Powell => Box::new(PowellMinimizer),
            Method::Bfgs => Box::new(BfgsMinimizer),
            Method::Lbfgsb => Box::new(LbfgsbMinimizer),
        }
    }
}

impl Minimizer for NelderMeadMinimizer {
    fn method(&self) -> Method {
        Method::NelderMead
    }

    fn minimize(
        &self, objective: &dyn Objective, p0: Theta, _bounds: &[(f64, f64)], max_iter: usize,
    ) -> OptResult<MinimizerOutcome> {
        let solver = build_nelder_mead(&p0)?;
        let problem = ArgMinAdapter::new(objective);
        let mut optimizer = Executor::new(problem, solver);
        optimizer = optimizer.configure(|state| state.param(p0).max_iters(max_iter as u64));
        #[cfg(feature = "obs_slog")]
        {
            let observer = argmin_observer_slog::SlogLogger::term_noblock();
            optimizer =
                optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
        }
        let state = optimizer.run()?.state().clone();
        summarize(&state, state.get_iter())
    }
}

impl Minimizer for PowellMinimizer {
    fn method(&self) -> Method {
        Method::Powell
    }

    fn minimize(
        &self, objective: &dyn Objective, p0: Theta, _bounds: &[(f64, f64)], max_iter: usize,
    ) -> OptResult<MinimizerOutcome> {
        let problem = ArgMinAdapter::new(objective);
        let mut optimizer = Executor::new(problem, build_powell());
        optimizer = optimizer.configure(|state| state.param(p0).max_iters(max_iter as u64));
        #[cfg(feature = "obs_slog")]
        {
            let observer = argmin_observer_slog::SlogLogger::term_noblock();
            optimizer =
                optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
        }
        let state = optimizer.run()?.state().clone();
        summarize(&state, state.get_iter())
    }
}

impl Minimizer for BfgsMinimizer {
    fn method(&self) -> Method {
        Method::Bfgs
    }

    fn minimize(
        &self, objective: &dyn Objective, p0: Theta, _bounds: &[(f64, f64)], max_iter: usize,
    ) -> OptResult<MinimizerOutcome> {
        let solver = build_bfgs()?;
        let problem = ArgMinAdapter::new(objective);
        let inv_hessian = Hessian::eye(p0.len());
        let mut optimizer = Executor::new(problem, solver);
        optimizer = optimizer.configure(|state| {
            state.param(p0).inv_hessian(inv_hessian).max_iters(max_iter as u64)
        });
        #[cfg(feature = "obs_slog")]
        {
            let observer = argmin_observer_slog::SlogLogger::term_noblock();
            optimizer =
                optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
        }
        let state = optimizer.run()?.state().clone();
        let gradient_calls = state.get_func_counts().get("gradient_count").copied();
        summarize(&state, gradient_calls.unwrap_or_else(|| state.get_iter()))
    }
}

impl Minimizer for LbfgsbMinimizer {
    fn method(&self) -> Method {
        Method::Lbfgsb
    }

    fn minimize(
        &self, objective: &dyn Objective, p0: Theta, bounds: &[(f64, f64)], max_iter: usize,
    ) -> OptResult<MinimizerOutcome> {
        let solver = build_lbfgsb()?;
        let theta0 = clamp_to_bounds(&p0, bounds);
        let problem = ProjectedAdapter::new(objective, bounds, &theta0);
        let z0 = problem.to_scaled(&theta0);
        let scale = bound_scales(bounds, &theta0);
        let mut optimizer = Executor::new(problem, solver);
        optimizer = optimizer.configure(|state| state.param(z0).max_iters(max_iter as u64));
        #[cfg(feature = "obs_slog")]
        {
            let observer = argmin_observer_slog::SlogLogger::term_noblock();
            optimizer =
                optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
        }
        let state = optimizer.run()?.state().clone();
        let mut outcome = summarize(&state, state.get_iter())?;
        outcome.theta_hat = clamp_to_bounds(&(&outcome.theta_hat * &scale), bounds);
        Ok(outcome)
    }
}

// ---- Helper Methods ----

/// Convert a final argmin state into a [`MinimizerOutcome`].
fn summarize<I>(state: &I, n_iter: u64) -> OptResult<MinimizerOutcome>
where
    I: State<Param = Theta, Float = Cost>,
{
    MinimizerOutcome::new(
        state.get_best_param().cloned(),
        state.get_best_cost(),
        state.get_termination_status(),
        n_iter,
        state.get_func_counts().clone(),
    )
}
