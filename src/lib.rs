//! archaic — composite-likelihood demographic inference.
//!
//! Purpose
//! -------
//! Fit parameterized demographic graphs (population splits, size changes,
//! migration and admixture) to two-locus heterozygosity statistics (H, H2)
//! and allele-frequency spectra (SFS) by minimizing a negative composite
//! log-likelihood, and estimate parameter uncertainty with Fisher or
//! Godambe information matrices.
//!
//! Key behaviors
//! -------------
//! - [`graph`]: demes-style YAML graphs, an editable builder document, and
//!   the `opt_info` provenance record attached to fitted graphs.
//! - [`params`]: the options document that maps named parameters onto graph
//!   paths, parameter sets with bounds, inequality constraints, and random
//!   perturbation of start values.
//! - [`spectra`]: H2 statistics with per-bin covariances, block-bootstrap
//!   archives, and SFS containers.
//! - [`model`]: the evaluator traits through which expected statistics are
//!   obtained from an external coalescent model.
//! - [`optimization`]: likelihoods, objectives, the minimizer dispatch and
//!   the `fit_h2` / `fit_sfs` / `fit_composite` drivers.
//! - [`inference`]: finite-difference information matrices and standard
//!   errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - The crate is single-threaded; per-run mutable state lives in an
//!   [`OptimizationContext`](optimization::context::OptimizationContext).
//! - Infeasible parameter vectors are answered with a penalty, never an
//!   error; configuration mistakes and numerical failures are typed errors.
//!
//! Conventions
//! -----------
//! - Each area has its own error enum and `Result` alias; lower-level errors
//!   convert upward with `From`.
//! - Progress and diagnostics go through the `log` facade; the library never
//!   installs a logger.
//!
//! Downstream usage
//! ----------------
//! - Implement [`H2Evaluator`](model::H2Evaluator) and/or
//!   [`SfsEvaluator`](model::SfsEvaluator) for the model backend, load a
//!   graph builder and options document, then call a fit driver and
//!   [`get_uncerts`](inference::get_uncerts).
//! - `use archaic::prelude::*;` imports the main surface.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to the code and share a one-deme fixture with
//!   closed-form evaluators; `tests/` runs an end-to-end fit.

pub mod graph;
pub mod inference;
pub mod linalg;
pub mod model;
pub mod optimization;
pub mod params;
pub mod spectra;
pub mod utils;

pub mod prelude {
    pub use crate::graph::prelude::*;
    pub use crate::inference::prelude::*;
    pub use crate::model::{H2Evaluator, SfsEvaluator};
    pub use crate::optimization::prelude::*;
    pub use crate::params::prelude::*;
    pub use crate::spectra::prelude::*;
}
