//! params — free parameters, bounds, constraints, and random restarts.
//!
//! Purpose
//! -------
//! Turn a (graph builder, options document) pair into the numeric problem
//! a minimizer sees: an ordered parameter vector with box bounds
//! ([`set::ParameterSet`]) and strict pairwise ordering constraints
//! ([`constraints::ConstraintSet`]). Also provides random starting points
//! ([`perturb`]).
//!
//! Key behaviors
//! -------------
//! - The options document is parsed once into typed specs
//!   ([`options::ParameterOptions`]); paths are resolved lazily against the
//!   builder.
//! - The mutation rate `u` is an optional trailing parameter with fixed
//!   default bounds.
//!
//! Downstream usage
//! ----------------
//! - Objectives check feasibility before every model evaluation and write
//!   candidate vectors back through [`options::ParameterOptions::write_values`].
pub mod constraints;
pub mod errors;
pub mod options;
pub mod perturb;
pub mod set;

pub mod prelude {
    pub use super::constraints::ConstraintSet;
    pub use super::errors::{ParamError, ParamResult};
    pub use super::options::{ConstraintKind, ConstraintSpec, ParameterOptions, ParameterSpec};
    pub use super::perturb::{
        get_param_arr, perturb_graph, perturb_parameters, DEFAULT_PERTURB_TIMEOUT,
    };
    pub use super::set::{ParameterSet, INIT_U, LOWER_U, MUTATION_RATE_NAME, UPPER_U};
}
