//! Errors raised while loading, editing, or validating demographic graphs.
//!
//! `GraphError` covers file and YAML failures, path lookups into a builder
//! document, and structural validation of the typed [`DemeGraph`] view.
//!
//! [`DemeGraph`]: crate::graph::demes::DemeGraph

/// Crate-wide result alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    // ---- I/O ----
    /// Reading or writing a graph file failed.
    Io { path: String, text: String },

    /// The document is not valid YAML or does not match the graph schema.
    Yaml { text: String },

    // ---- Paths ----
    /// A path segment could not be interpreted as a field name or index.
    InvalidPathKey { text: String },

    /// No node exists at the requested path.
    PathNotFound { path: String },

    /// The node at the requested path is not a number.
    NonNumericValue { path: String },

    // ---- Validation ----
    /// The graph violates a structural rule (sizes, times, ancestry, ...).
    InvalidGraph { reason: String },

    /// The `opt_info` metadata entry could not be decoded.
    InvalidMetadata { text: String },
}

impl std::error::Error for GraphError {}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::Io { path, text } => write!(f, "Graph I/O error on '{path}': {text}"),
            GraphError::Yaml { text } => write!(f, "Graph YAML error: {text}"),
            GraphError::InvalidPathKey { text } => write!(f, "Invalid graph path key: {text}"),
            GraphError::PathNotFound { path } => write!(f, "No graph field at path '{path}'"),
            GraphError::NonNumericValue { path } => {
                write!(f, "Graph field at '{path}' is not numeric")
            }
            GraphError::InvalidGraph { reason } => write!(f, "Invalid demographic graph: {reason}"),
            GraphError::InvalidMetadata { text } => write!(f, "Invalid opt_info metadata: {text}"),
        }
    }
}

impl From<serde_yaml_ng::Error> for GraphError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        GraphError::Yaml { text: err.to_string() }
    }
}

impl GraphError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        GraphError::Io { path: path.display().to_string(), text: err.to_string() }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        GraphError::InvalidGraph { reason: reason.into() }
    }
}
