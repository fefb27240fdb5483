//! optimization — likelihoods, objectives, minimizers, and fit drivers.
//!
//! Purpose
//! -------
//! Provide the fitting layer of the crate: score expected H2 statistics and
//! SFS against data, wrap those scores as objectives over a demographic
//! parameter vector, minimize them with one of four methods, and return the
//! fitted graph annotated with its optimization provenance.
//!
//! Key behaviors
//! -------------
//! - [`likelihood`]: composite Gaussian log-likelihood of H2 statistics with
//!   a cache of inverted covariance matrices.
//! - [`objective`]: H2, SFS and composite objectives returning `−ℓ(θ)`, with
//!   the penalty `1e10` outside bounds or constraints.
//! - [`minimizer`]: argmin-backed Nelder–Mead, BFGS and bounded L-BFGS plus
//!   a crate-local Powell solver, behind one dispatch.
//! - [`fit`]: the `fit_h2`, `fit_sfs` and `fit_composite` drivers.
//! - [`errors`]: one error surface ([`OptError`](errors::OptError)) for
//!   configuration mistakes, numerical failures and backend solver errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - All mutable evaluation state (call counter, inverse-covariance cache)
//!   lives in a per-run [`OptimizationContext`](context::OptimizationContext).
//! - Infeasible parameter vectors are answered with the penalty value, never
//!   with an error.
//!
//! Conventions
//! -----------
//! - Solvers minimize the cost `c(θ) = −ℓ(θ)`; provenance reports
//!   `fopt = ℓ(θ̂)`.
//! - Progress lines go through the `log` facade at `info` level.
//!
//! Downstream usage
//! ----------------
//! - Callers usually import `optimization::prelude::*` and call one of the
//!   fit drivers; [`inference`](crate::inference) reuses the likelihood and
//!   context for uncertainty estimation.
//!
//! Testing notes
//! -------------
//! - Unit tests in every submodule run against a shared one-deme fixture
//!   with closed-form evaluators.

pub mod context;
pub mod errors;
pub mod fit;
pub mod likelihood;
pub mod minimizer;
pub mod objective;

#[cfg(test)]
pub(crate) mod test_support;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use archaic::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::context::OptimizationContext;
    pub use super::errors::{OptError, OptResult};
    pub use super::fit::{fit_composite, fit_h2, fit_sfs, FitOptions};
    pub use super::likelihood::{log_gaussian, log_likelihood};
    pub use super::minimizer::{optimize, Method, MutationRate, OptimizeOptions, Optimized};
    pub use super::objective::{
        CompositeObjective, FitProblem, H2Objective, Objective, SfsObjective, SfsScaling,
    };
}
