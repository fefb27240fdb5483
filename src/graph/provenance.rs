//! graph::provenance — typed `opt_info` record attached to fitted graphs.
//!
//! Purpose
//! -------
//! Describe how a graph's parameter values were obtained: the minimizer,
//! the objective, the achieved log-likelihood, iteration and evaluation
//! counts, the exit flag, and the fitted mutation rate when it was free.
//!
//! Conventions
//! -----------
//! - `fopt` is a log-likelihood (higher is better), i.e. the negated
//!   minimum of the objective.
//! - `u` is `None` when the mutation rate was held fixed during the fit.
//! - The record lives under the graph metadata key [`OPT_INFO_KEY`].
use serde::{Deserialize, Serialize};
use std::fmt;

/// Metadata key under which [`OptimizationProvenance`] is stored.
pub const OPT_INFO_KEY: &str = "opt_info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationProvenance {
    pub method: String,
    pub objective_func: String,
    pub fopt: f64,
    pub max_iter: usize,
    pub n_iter: u64,
    pub func_calls: u64,
    pub flag: i32,
    #[serde(default)]
    pub u: Option<f64>,
}

impl fmt::Display for OptimizationProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16}{}", "method", self.method)?;
        writeln!(f, "{:<16}{}", "objective_func", self.objective_func)?;
        writeln!(f, "{:<16}{}", "fopt", self.fopt)?;
        writeln!(f, "{:<16}{}", "max_iter", self.max_iter)?;
        writeln!(f, "{:<16}{}", "n_iter", self.n_iter)?;
        writeln!(f, "{:<16}{}", "func_calls", self.func_calls)?;
        writeln!(f, "{:<16}{}", "flag", self.flag)?;
        match self.u {
            Some(u) => write!(f, "{:<16}{u:e}", "u"),
            None => write!(f, "{:<16}fixed", "u"),
        }
    }
}
