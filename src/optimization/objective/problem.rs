//! objective::problem — the parameter side shared by every objective.
//!
//! Purpose
//! -------
//! Hold everything an objective needs to turn a candidate vector into a
//! demographic graph: the builder document, the options that map
//! parameters onto graph fields, the parameter set with its bounds, the
//! ordering constraints, and whether `u` rides along as the last entry.
//!
//! Key behaviors
//! -------------
//! - [`FitProblem::prepare`] performs the evaluation prologue in order:
//!   count the call, split off `u`, reject infeasible points, build a fresh
//!   graph.
//! - [`FitProblem::report`] emits the periodic progress line.
//!
//! Invariants & assumptions
//! ------------------------
//! - The parameter set has one entry per options parameter, plus a
//!   trailing `u` exactly when `fit_u` is set.
//! - Constraint indices refer to positions in the parameter set.
use crate::graph::{builder::GraphBuilder, demes::DemeGraph};
use crate::optimization::{
    context::OptimizationContext,
    errors::{OptError, OptResult},
    minimizer::types::Theta,
};
use crate::params::{
    constraints::ConstraintSet,
    options::ParameterOptions,
    set::{ParameterSet, MUTATION_RATE_NAME},
};
use crate::utils::{status_line, PROGRESS_TARGET};

/// Negative log-likelihood returned for infeasible points.
pub const OUT_OF_BOUNDS_PENALTY: f64 = 1e10;

#[derive(Debug, Clone)]
pub struct FitProblem<'a> {
    builder: &'a GraphBuilder,
    options: &'a ParameterOptions,
    params: ParameterSet,
    constraints: ConstraintSet,
    fit_u: bool,
    verbosity: usize,
    ctx: &'a OptimizationContext,
}

/// A feasible candidate turned into a graph.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// 1-based index of this evaluation within the run.
    pub call: usize,
    pub graph: DemeGraph,
    /// The fitted mutation rate when `u` is free.
    pub u: Option<f64>,
}

impl<'a> FitProblem<'a> {
    /// Errors
    /// ------
    /// - [`OptError::DimensionMismatch`] if the parameter set does not have
    ///   one entry per options parameter (plus `u` when `fit_u`).
    /// - [`OptError::MissingMutationRate`] if `fit_u` is set but the last
    ///   parameter is not `u`.
    pub fn new(
        builder: &'a GraphBuilder, options: &'a ParameterOptions, params: ParameterSet,
        constraints: ConstraintSet, fit_u: bool, ctx: &'a OptimizationContext,
    ) -> OptResult<Self> {
        let expected = options.len() + usize::from(fit_u);
        if params.len() != expected {
            return Err(OptError::DimensionMismatch {
                what: "free parameters",
                expected,
                found: params.len(),
            });
        }
        if fit_u && params.names().last().map(String::as_str) != Some(MUTATION_RATE_NAME) {
            return Err(OptError::MissingMutationRate);
        }
        Ok(Self { builder, options, params, constraints, fit_u, verbosity: 0, ctx })
    }

    /// Log a status line every `verbosity` evaluations; `0` disables.
    pub fn with_verbosity(mut self, verbosity: usize) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn builder(&self) -> &GraphBuilder {
        self.builder
    }

    pub fn options(&self) -> &ParameterOptions {
        self.options
    }

    pub fn fit_u(&self) -> bool {
        self.fit_u
    }

    pub fn ctx(&self) -> &OptimizationContext {
        self.ctx
    }

    /// Evaluation prologue.
    ///
    /// Returns `Ok(None)` when `theta` violates a bound or constraint, in
    /// which case the caller returns [`OUT_OF_BOUNDS_PENALTY`] without
    /// touching the model.
    ///
    /// Errors
    /// ------
    /// - [`OptError::DimensionMismatch`] if `theta` has the wrong length.
    /// - Graph errors from writing values or building the graph.
    pub fn prepare(&self, theta: &Theta) -> OptResult<Option<Candidate>> {
        let call = self.ctx.record_call();
        if theta.len() != self.params.len() {
            return Err(OptError::DimensionMismatch {
                what: "parameter vector",
                expected: self.params.len(),
                found: theta.len(),
            });
        }
        if !self.params.is_feasible(theta.view(), Some(&self.constraints)) {
            return Ok(None);
        }
        let n_graph = self.options.len();
        let u = self.fit_u.then(|| theta[n_graph]);
        let mut builder = self.builder.clone();
        self.options.write_values(&mut builder, theta.slice(ndarray::s![..n_graph]))?;
        let graph = builder.build()?;
        Ok(Some(Candidate { call, graph, u }))
    }

    /// Emit the progress line for evaluation `call` when it is due.
    pub fn report(&self, call: usize, ll: f64, theta: &Theta) {
        if self.verbosity > 0 && call % self.verbosity == 0 {
            log::info!(target: PROGRESS_TARGET, "{}", status_line(call, ll, theta.view()));
        }
    }
}
