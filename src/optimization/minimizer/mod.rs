//! minimizer — argmin-powered minimization of demographic objectives.
//!
//! Purpose
//! -------
//! Provide the optimizer dispatch for the fit drivers: minimize an
//! [`Objective`](crate::optimization::objective::Objective) with one of four
//! methods, then normalize the result into an [`Optimized`] value carrying
//! the fitted parameters and their [`OptimizationProvenance`].
//!
//! Key behaviors
//! -------------
//! - [`Method`] selects Nelder–Mead, Powell, BFGS, or bounded L-BFGS;
//!   unknown names fail at parse time, before any objective evaluation.
//! - Each method is a [`Minimizer`] that runs an argmin `Executor`
//!   ([`run`]) over an adapted problem ([`adapter`]) with a solver from
//!   [`builders`]. Powell is a crate-local argmin solver ([`powell`]).
//! - [`optimize`] validates the start vector, dispatches, records
//!   provenance (`fopt = −min cost`), splits a free mutation rate off the
//!   optimum, and resets the context's call counter.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives return the cost `−ℓ(θ)` and the penalty `1e10` outside the
//!   feasible region; only L-BFGS-B also uses the bounds directly.
//! - Vectors use the aliases in [`types`].
//!
//! Conventions
//! -----------
//! - Exit flags: `0` converged, `1` iteration budget exhausted, `2` any
//!   other stop.
//! - For BFGS, `n_iter` counts gradient evaluations; for the other methods
//!   it counts solver iterations.
//! - argmin errors are converted into `OptError` at the solver boundary.
//!
//! Downstream usage
//! ----------------
//! - The fit drivers in [`crate::optimization::fit`] call [`optimize`] and
//!   [`Optimized::into_graph`].
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover method parsing, the adapters' gradients,
//!   the Powell line search, every method on a smooth bowl, and provenance
//!   bookkeeping on the shared fixture.
//!
//! [`OptimizationProvenance`]: crate::graph::provenance::OptimizationProvenance

pub mod adapter;
pub mod api;
pub mod builders;
pub mod powell;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::{optimize, MutationRate, Optimized};
pub use self::traits::{Method, Minimizer, MinimizerOutcome, OptimizeOptions};
pub use self::types::{Cost, FnEvalMap, Grad, Theta};
