use argmin::core::{ArgminError, Error};

use crate::graph::errors::GraphError;
use crate::params::errors::ParamError;
use crate::spectra::errors::StatsError;

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Gradient ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Options ----
    /// Minimization method name is not one of the supported methods.
    UnsupportedMethod {
        name: String,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// SFS scaling needs either a fixed `uL` or a sequence length `L`.
    MissingSequenceLength {
        reason: &'static str,
    },
    /// The mutation rate is neither fixed nor a free parameter.
    MissingMutationRate,

    // ---- Likelihood ----
    /// Model, data, covariance, or start-vector sizes disagree.
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// The data spectrum carries no covariance matrices.
    MissingCovariance,
    /// A bin covariance matrix could not be inverted.
    SingularCovariance {
        bin: usize,
    },

    // ---- Cost function ----
    /// Cost function returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Lower layers ----
    /// Building or annotating the demographic graph failed.
    Graph(GraphError),
    /// Parameter options, bounds, or values were rejected.
    Param(ParamError),
    /// Spectrum construction or model evaluation failed.
    Stats(StatsError),

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Gradient ----
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Options ----
            OptError::UnsupportedMethod { name, reason } => {
                write!(f, "Unsupported minimization method '{name}': {reason}")
            }
            OptError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            OptError::MissingSequenceLength { reason } => {
                write!(f, "Missing sequence length: {reason}")
            }
            OptError::MissingMutationRate => {
                write!(f, "Mutation rate must be fixed or fit as the last parameter")
            }

            // ---- Likelihood ----
            OptError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch in {what}: expected {expected}, found {found}")
            }
            OptError::MissingCovariance => {
                write!(f, "Data spectrum has no covariance matrices")
            }
            OptError::SingularCovariance { bin } => {
                write!(f, "Covariance matrix of bin {bin} is singular")
            }

            // ---- Cost function ----
            OptError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }

            // ---- Optimizer outcome ----
            OptError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            OptError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Lower layers ----
            OptError::Graph(err) => write!(f, "Graph error: {err}"),
            OptError::Param(err) => write!(f, "Parameter error: {err}"),
            OptError::Stats(err) => write!(f, "Statistics error: {err}"),

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

impl From<GraphError> for OptError {
    fn from(err: GraphError) -> Self {
        OptError::Graph(err)
    }
}

impl From<ParamError> for OptError {
    fn from(err: ParamError) -> Self {
        OptError::Param(err)
    }
}

impl From<StatsError> for OptError {
    fn from(err: StatsError) -> Self {
        OptError::Stats(err)
    }
}
