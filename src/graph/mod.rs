//! graph — demographic graphs, the builder document, and fit provenance.
//!
//! Purpose
//! -------
//! Provide the minimal demographic-graph layer the inference core needs:
//! an editable YAML document addressed by parameter paths
//! ([`builder::GraphBuilder`]), a typed and validated graph view
//! ([`demes::DemeGraph`]), and the `opt_info` record describing how a
//! fitted graph was obtained ([`provenance::OptimizationProvenance`]).
//!
//! Key behaviors
//! -------------
//! - Objectives rebuild a fresh graph from the builder at every
//!   evaluation; the builder is the only mutable representation.
//! - Validation happens on every build, so evaluators never see an
//!   ill-formed graph.
//!
//! Downstream usage
//! ----------------
//! - `params` reads and writes parameter values through [`path::GraphPath`].
//! - `model` evaluators consume [`demes::DemeGraph`].
//! - `optimization` attaches provenance to the fitted graph.
pub mod builder;
pub mod demes;
pub mod errors;
pub mod path;
pub mod provenance;

pub mod prelude {
    pub use super::builder::GraphBuilder;
    pub use super::demes::{Deme, DemeGraph, Epoch, Migration, Pulse};
    pub use super::errors::{GraphError, GraphResult};
    pub use super::path::{GraphPath, PathKey};
    pub use super::provenance::{OptimizationProvenance, OPT_INFO_KEY};
}
