//! inference — uncertainty of fitted demographic parameters.
//!
//! Purpose
//! -------
//! Provide post-fit uncertainty quantification for the H2 composite
//! likelihood: relative-step finite-difference derivatives, the observed
//! Fisher information and the Godambe (sandwich) information, and standard
//! errors derived from either.
//!
//! Key behaviors
//! -------------
//! - Define a unified error and result type, [`InferenceError`] and
//!   [`InferenceResult`], for configuration mistakes (no bootstraps, no
//!   mutation rate) and numerical degeneracies (zero steps, non-finite or
//!   singular matrices).
//! - Approximate Hessians and gradients of a fallible scalar function with
//!   [`hessian`] and [`gradient`].
//! - Build `H = −∇²ℓ` or `G = H J⁻¹ H` with [`godambe_matrix`].
//! - Report names, values and standard errors with [`get_uncerts`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Composite likelihoods ignore the correlation between statistics, so
//!   the Fisher information overstates precision; the Godambe matrix
//!   corrects for it with the spread of bootstrap scores.
//! - Every parameter must be non-zero for the relative step.
//!
//! Conventions
//! -----------
//! - Derivatives are taken in the natural parameter space of the options
//!   document, with `u` last when it is estimated.
//! - Evaluation state (inverse-covariance cache) is borrowed from an
//!   [`OptimizationContext`](crate::optimization::context::OptimizationContext).
//!
//! Downstream usage
//! ----------------
//! - After a fit, call [`get_uncerts`] with the fitted graph's builder, the
//!   same options document and data, and (for GIM) bootstrap replicates
//!   from [`H2Spectrum::bootstrap_replicates`].
//!
//! [`H2Spectrum::bootstrap_replicates`]: crate::spectra::h2::H2Spectrum::bootstrap_replicates
//!
//! Testing notes
//! -------------
//! - Unit tests check the Hessian of a quadratic against `−2A`, the
//!   memoization count of the Godambe computation, and FIM/GIM standard
//!   errors on the shared fixture.

pub mod errors;
pub mod finite_diff;
pub mod godambe;
pub mod uncerts;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};
pub use self::finite_diff::{gradient, hessian};
pub use self::godambe::godambe_matrix;
pub use self::uncerts::{get_uncerts, Uncertainties, UncertaintyMethod, DEFAULT_DELTA};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use archaic::inference::prelude::*;` to import the
// primary inference surface in a single line.

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::godambe::godambe_matrix;
    pub use super::uncerts::{get_uncerts, Uncertainties, UncertaintyMethod, DEFAULT_DELTA};
}
