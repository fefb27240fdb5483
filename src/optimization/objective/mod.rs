//! objective — negative composite log-likelihoods over graph parameters.
//!
//! Purpose
//! -------
//! Map a candidate parameter vector to a scalar cost that minimizers can
//! drive down: rebuild the demographic graph, ask the model evaluator for
//! expected statistics, and score them against data.
//!
//! Key behaviors
//! -------------
//! - Every objective shares the [`FitProblem`] prologue (call counting,
//!   `u` splitting, feasibility, graph build).
//! - Infeasible points cost [`OUT_OF_BOUNDS_PENALTY`] and never reach the
//!   evaluator.
//! - Variants: [`H2Objective`] (H2 with or without the H row),
//!   [`SfsObjective`] (Poisson SFS likelihood with fixed or per-site
//!   scaling), [`CompositeObjective`] (SFS plus H2 without H).
//!
//! Invariants & assumptions
//! ------------------------
//! - For feasible points the value depends only on `theta` and the data;
//!   the call counter and progress lines are the only side effects.
//!
//! Conventions
//! -----------
//! - `evaluate` returns the cost `−ℓ(θ)`; progress lines show `ℓ(θ)`.
//! - `name()` is recorded as `objective_func` in the fit provenance.
pub mod composite;
pub mod h2;
pub mod problem;
pub mod sfs;

pub use self::composite::CompositeObjective;
pub use self::h2::H2Objective;
pub use self::problem::{Candidate, FitProblem, OUT_OF_BOUNDS_PENALTY};
pub use self::sfs::{SfsObjective, SfsScaling};

use crate::optimization::{errors::OptResult, minimizer::types::Theta};

/// A cost function over the free parameters of a fit.
pub trait Objective {
    /// Identifier recorded in the fit provenance.
    fn name(&self) -> &str;

    /// Negative log-likelihood at `theta`, or the penalty when `theta` is
    /// infeasible.
    fn evaluate(&self, theta: &Theta) -> OptResult<f64>;
}

impl<T: Objective + ?Sized> Objective for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
        (**self).evaluate(theta)
    }
}
