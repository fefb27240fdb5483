//! minimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types, solver aliases, and fixed solver settings
//! used by the minimizers, so the rest of the optimization code stays
//! agnostic to `ndarray` and argmin generics.
//!
//! Invariants & assumptions
//! ------------------------
//! - All vectors and matrices are `ndarray` containers over `f64`.
//! - `Cost` is the negative log-likelihood; higher layers flip the sign for
//!   reporting.
//! - The line-search and solver aliases assume argmin's generic forms as of
//!   the pinned argmin version.
//!
//! Testing notes
//! -------------
//! - Only aliases and constants live here; they are exercised by the
//!   solver tests in `run`.
use argmin::core::IterState;
use argmin::solver::{
    linesearch::MoreThuenteLineSearch,
    neldermead::NelderMead,
    quasinewton::{BFGS, LBFGS},
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Parameter vector `θ`.
pub type Theta = Array1<f64>;

/// Gradient of the cost, same shape as [`Theta`].
pub type Grad = Array1<f64>;

/// Dense `n × n` matrix (BFGS inverse-Hessian approximation).
pub type Hessian = Array2<f64>;

/// Scalar cost `c(θ) = −ℓ(θ)`.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin
/// (e.g. `"cost_count"`, `"gradient_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// History size (`m`) for the bounded L-BFGS run.
pub const DEFAULT_LBFGS_MEM: usize = 10;

/// Gradient-norm tolerance for BFGS and L-BFGS-B.
pub const TOL_GRAD: f64 = 1e-5;

/// Difference step for L-BFGS-B gradients, in box-width units.
pub const LBFGSB_FD_STEP: f64 = 1e-6;

/// Standard deviation of simplex costs below which Nelder–Mead stops.
pub const NM_SD_TOLERANCE: f64 = 1e-6;

/// Relative offset of each non-zero coordinate in the initial simplex.
pub const SIMPLEX_NONZERO_SCALE: f64 = 1.05;

/// Absolute value used for zero coordinates in the initial simplex.
pub const SIMPLEX_ZERO_STEP: f64 = 0.00025;

/// Relative change of the cost below which a Powell sweep counts as
/// converged.
pub const POWELL_FTOL: f64 = 1e-4;

/// Relative tolerance of Powell's Brent line minimizations.
pub const POWELL_LINE_TOL: f64 = 1e-2;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// BFGS wired to the More–Thuente line search.
pub type BfgsMoreThuente = BFGS<MoreThuenteLS, Cost>;

/// Nelder–Mead over [`Theta`].
pub type NelderMeadSolver = NelderMead<Theta, Cost>;

/// Solver state for derivative-free methods.
pub type SimplexState = IterState<Theta, (), (), (), (), Cost>;

/// Solver state for L-BFGS.
pub type LbfgsState = IterState<Theta, Grad, (), (), (), Cost>;

/// Solver state for BFGS.
pub type BfgsState = IterState<Theta, Grad, (), Hessian, (), Cost>;
