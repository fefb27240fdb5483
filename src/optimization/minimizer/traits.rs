//! Public configuration and result types for the minimizers.
//!
//! - [`Method`]: the four supported minimization methods.
//! - [`OptimizeOptions`]: method plus iteration budget.
//! - [`Minimizer`]: one implementation per method, each driving an argmin
//!   solver through the [`adapter`](super::adapter) layer.
//! - [`MinimizerOutcome`]: normalized result of a single minimization.
//!
//! Convention: every minimizer *minimizes* the cost `c(θ) = −ℓ(θ)` produced
//! by an [`Objective`].
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        types::{Cost, FnEvalMap, Theta},
        validation::{validate_theta_hat, validate_value},
    },
    objective::Objective,
};
use argmin::core::{TerminationReason, TerminationStatus};
use std::fmt;
use std::str::FromStr;

/// Minimization method.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"NelderMead"`, `"Powell"`, `"BFGS"`, `"LBFGSB"`). Unknown names return
/// `OptError::UnsupportedMethod` before any objective is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    NelderMead,
    Powell,
    Bfgs,
    Lbfgsb,
}

impl FromStr for Method {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "neldermead" | "nelder-mead" => Ok(Method::NelderMead),
            "powell" => Ok(Method::Powell),
            "bfgs" => Ok(Method::Bfgs),
            "lbfgsb" | "l-bfgs-b" => Ok(Method::Lbfgsb),
            _ => Err(OptError::UnsupportedMethod {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'NelderMead', 'Powell', 'BFGS' or \
                         'LBFGSB'.",
            }),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::NelderMead => "NelderMead",
            Method::Powell => "Powell",
            Method::Bfgs => "BFGS",
            Method::Lbfgsb => "LBFGSB",
        };
        f.write_str(name)
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `method: Method` — minimization method.
/// - `max_iter: usize` — hard cap on solver iterations (one Powell sweep
///   counts as one iteration).
///
/// Default:
/// - `method`: `NelderMead`
/// - `max_iter`: `1000`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeOptions {
    pub method: Method,
    pub max_iter: usize,
}

impl OptimizeOptions {
    /// Errors
    /// ------
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(method: Method, max_iter: usize) -> OptResult<Self> {
        if max_iter == 0 {
            return Err(OptError::InvalidMaxIter {
                max_iter,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(Self { method, max_iter })
    }
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self { method: Method::NelderMead, max_iter: 1000 }
    }
}

/// One minimization method behind a uniform interface.
pub trait Minimizer {
    fn method(&self) -> Method;

    /// Minimize `objective` from `p0`.
    ///
    /// Parameters
    /// ----------
    /// - `bounds`: per-parameter `(lower, upper)`; only the bounded
    ///   quasi-Newton method uses them directly, the others rely on the
    ///   objective's out-of-bounds penalty.
    /// - `max_iter`: iteration cap handed to the argmin executor.
    fn minimize(
        &self, objective: &dyn Objective, p0: Theta, bounds: &[(f64, f64)], max_iter: usize,
    ) -> OptResult<MinimizerOutcome>;
}

/// Canonical result of one minimization.
///
/// - `theta_hat`: best parameter vector found.
/// - `f_opt`: best **cost** `c(θ̂) = −ℓ(θ̂)`.
/// - `n_iter`: solver iterations (gradient evaluations for BFGS).
/// - `func_calls`: cost evaluations counted by argmin.
/// - `fn_evals`: argmin's counters, e.g. `cost_count`, `gradient_count`.
/// - `exit_flag`: `0` converged, `1` iteration limit, `2` other stop.
/// - `status`: human-readable termination status.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizerOutcome {
    pub theta_hat: Theta,
    pub f_opt: Cost,
    pub n_iter: u64,
    pub func_calls: u64,
    pub fn_evals: FnEvalMap,
    pub exit_flag: i32,
    pub status: String,
}

impl MinimizerOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// Errors
    /// ------
    /// - [`OptError::MissingThetaHat`] / [`OptError::InvalidThetaHat`] for a
    ///   missing or non-finite best parameter.
    /// - [`OptError::NonFiniteCost`] for a non-finite best cost.
    pub fn new(
        theta_hat_opt: Option<Theta>, f_opt: Cost, termination: &TerminationStatus, n_iter: u64,
        fn_evals: FnEvalMap,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(f_opt)?;
        let status = match termination {
            TerminationStatus::NotTerminated => "Not terminated".to_string(),
            TerminationStatus::Terminated(reason) => format!("{reason:?}"),
        };
        let func_calls = fn_evals.get("cost_count").copied().unwrap_or(0);
        Ok(Self {
            theta_hat,
            f_opt,
            n_iter,
            func_calls,
            fn_evals,
            exit_flag: exit_flag(termination),
            status,
        })
    }
}

/// Map an argmin termination status onto the numeric exit flag.
pub fn exit_flag(termination: &TerminationStatus) -> i32 {
    match termination {
        TerminationStatus::Terminated(
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached,
        ) => 0,
        TerminationStatus::Terminated(TerminationReason::MaxItersReached) => 1,
        _ => 2,
    }
}
