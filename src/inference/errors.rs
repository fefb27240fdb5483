//! Unified error handling for uncertainty estimation.
//!
//! This module defines `InferenceError`, the error type used by the
//! finite-difference derivatives, the Godambe matrix, and `get_uncerts`. It
//! groups configuration mistakes (missing bootstraps or mutation rate) with
//! numerical degeneracies (zero steps, non-finite or singular matrices) and
//! passes lower-layer errors through. An alias `InferenceResult<T>`
//! standardizes the return type across inference code.
use crate::graph::errors::GraphError;
use crate::optimization::errors::OptError;
use crate::params::errors::ParamError;
use crate::spectra::errors::StatsError;

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Finite differences ----
    /// A parameter is zero (or the step is non-finite), so the relative step
    /// `delta × p` cannot be used.
    ZeroStep {
        index: usize,
        value: f64,
    },

    /// A Hessian or gradient entry is non-finite.
    InvalidHessian {
        row: usize,
        col: usize,
        value: f64,
    },

    // ---- Configuration ----
    /// The Godambe matrix needs at least one bootstrap replicate.
    MissingBootstraps,

    /// `u` was not given and the graph records no fitted mutation rate.
    MissingMutationRate,

    /// Unknown uncertainty method name.
    UnsupportedMethod {
        name: String,
    },

    // ---- Linear algebra ----
    /// A matrix that must be inverted is singular.
    SingularMatrix {
        what: &'static str,
    },

    // ---- Lower layers ----
    Opt(OptError),
    Graph(GraphError),
    Param(ParamError),
    Stats(StatsError),

    // ---- Fallback ----
    UnknownError,
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Finite differences ----
            InferenceError::ZeroStep { index, value } => write!(
                f,
                "Inference Error: Parameter {index} = {value} gives a zero finite-difference step"
            ),
            InferenceError::InvalidHessian { row, col, value } => {
                write!(f, "Inference Error: Non-finite derivative at ({row}, {col}): {value}")
            }

            // ---- Configuration ----
            InferenceError::MissingBootstraps => {
                write!(f, "Inference Error: The GIM method needs bootstrap replicates")
            }
            InferenceError::MissingMutationRate => write!(
                f,
                "Inference Error: Mutation rate is neither given nor recorded in opt_info"
            ),
            InferenceError::UnsupportedMethod { name } => write!(
                f,
                "Inference Error: Unsupported uncertainty method '{name}'; use 'FIM' or 'GIM'"
            ),

            // ---- Linear algebra ----
            InferenceError::SingularMatrix { what } => {
                write!(f, "Inference Error: The {what} matrix is singular")
            }

            // ---- Lower layers ----
            InferenceError::Opt(err) => write!(f, "Inference Error: {err}"),
            InferenceError::Graph(err) => write!(f, "Inference Error: {err}"),
            InferenceError::Param(err) => write!(f, "Inference Error: {err}"),
            InferenceError::Stats(err) => write!(f, "Inference Error: {err}"),

            // ---- Fallback ----
            InferenceError::UnknownError => write!(f, "Inference Error: Unknown error occurred"),
        }
    }
}

impl From<OptError> for InferenceError {
    fn from(err: OptError) -> Self {
        InferenceError::Opt(err)
    }
}

impl From<GraphError> for InferenceError {
    fn from(err: GraphError) -> Self {
        InferenceError::Graph(err)
    }
}

impl From<ParamError> for InferenceError {
    fn from(err: ParamError) -> Self {
        InferenceError::Param(err)
    }
}

impl From<StatsError> for InferenceError {
    fn from(err: StatsError) -> Self {
        InferenceError::Stats(err)
    }
}
