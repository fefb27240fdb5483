//! Errors for parameter options, bounds, constraints, and perturbation.
use crate::graph::errors::GraphError;

pub type ParamResult<T> = Result<T, ParamError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParamError {
    // ---- Options document ----
    /// The options document is not valid YAML or does not match its schema.
    Yaml { text: String },

    /// Reading the options file failed.
    Io { path: String, text: String },

    /// The options document declares no parameters.
    EmptyParameters,

    /// A parameter names no graph field.
    MissingPath { name: String },

    /// Two parameters share a name.
    DuplicateName { name: String },

    /// A constraint refers to a parameter that does not exist.
    UnknownParameter { name: String },

    /// A constraint entry is malformed.
    InvalidConstraint { reason: String },

    // ---- Bounds and values ----
    /// `lower > upper`, or a bound is NaN.
    InvalidBounds { name: String, lower: f64, upper: f64 },

    /// The initial value read from the graph lies outside its bounds.
    InitialValueOutOfBounds { name: String, value: f64, lower: f64, upper: f64 },

    /// A parameter vector has the wrong length for the parameter set.
    DimensionMismatch { expected: usize, found: usize },

    // ---- Perturbation ----
    /// Random draws require every upper bound to be finite.
    InfiniteUpperBound { name: String },

    /// Log-uniform draws require a strictly positive lower bound.
    NonPositiveLogBound { name: String, lower: f64 },

    /// No draw satisfied the constraints within the retry budget.
    PerturbationTimeout { attempts: usize },

    // ---- Wrapped ----
    Graph(GraphError),
}

impl std::error::Error for ParamError {}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::Yaml { text } => write!(f, "Options YAML error: {text}"),
            ParamError::Io { path, text } => write!(f, "Options I/O error on '{path}': {text}"),
            ParamError::EmptyParameters => write!(f, "Options declare no parameters."),
            ParamError::MissingPath { name } => {
                write!(f, "Parameter '{name}' does not name any graph field.")
            }
            ParamError::DuplicateName { name } => write!(f, "Duplicate parameter name '{name}'."),
            ParamError::UnknownParameter { name } => write!(f, "Unknown parameter '{name}'."),
            ParamError::InvalidConstraint { reason } => write!(f, "Invalid constraint: {reason}"),
            ParamError::InvalidBounds { name, lower, upper } => {
                write!(f, "Invalid bounds for '{name}': lower {lower} > upper {upper}.")
            }
            ParamError::InitialValueOutOfBounds { name, value, lower, upper } => write!(
                f,
                "Initial value {value} of '{name}' lies outside [{lower}, {upper}]."
            ),
            ParamError::DimensionMismatch { expected, found } => {
                write!(f, "Parameter vector has length {found}; expected {expected}.")
            }
            ParamError::InfiniteUpperBound { name } => {
                write!(f, "All upper bounds must be specified; '{name}' is unbounded.")
            }
            ParamError::NonPositiveLogBound { name, lower } => write!(
                f,
                "Parameter '{name}' is drawn log-uniformly but has lower bound {lower} <= 0."
            ),
            ParamError::PerturbationTimeout { attempts } => {
                write!(f, "Parameter perturbation timeout after {attempts} rejected draws.")
            }
            ParamError::Graph(e) => write!(f, "{e}"),
        }
    }
}

impl From<GraphError> for ParamError {
    fn from(err: GraphError) -> Self {
        ParamError::Graph(err)
    }
}

impl From<serde_yaml_ng::Error> for ParamError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        ParamError::Yaml { text: err.to_string() }
    }
}
