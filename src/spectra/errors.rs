//! Errors for statistic containers, archives, and the block bootstrap.

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    // ---- Shapes ----
    /// A dimension does not match what the container requires.
    DimensionMismatch { what: &'static str, expected: usize, found: usize },

    /// A shape constraint other than a single length is violated.
    InvalidShape { reason: String },

    /// A requested sample or population is not present.
    UnknownSample { name: String },

    /// The spectrum carries no one-locus H row.
    NoH,

    // ---- Bootstrap ----
    /// No window blocks, no windows, or fewer than two iterations.
    EmptyBootstrap,

    /// Window blocks disagree on pair ids or recombination bins.
    InconsistentBlocks { reason: String },

    // ---- I/O ----
    Io { path: String, text: String },

    Json { text: String },

    // ---- External ----
    /// The model evaluator failed.
    Evaluator { text: String },
}

impl std::error::Error for StatsError {}

impl std::fmt::Display for StatsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsError::DimensionMismatch { what, expected, found } => {
                write!(f, "Dimension mismatch in {what}: expected {expected}, found {found}.")
            }
            StatsError::InvalidShape { reason } => write!(f, "Invalid shape: {reason}"),
            StatsError::UnknownSample { name } => write!(f, "Unknown sample '{name}'."),
            StatsError::NoH => write!(f, "Spectrum has no H row."),
            StatsError::EmptyBootstrap => {
                write!(f, "Bootstrap needs at least one window and two iterations.")
            }
            StatsError::InconsistentBlocks { reason } => {
                write!(f, "Inconsistent window blocks: {reason}")
            }
            StatsError::Io { path, text } => write!(f, "I/O error on '{path}': {text}"),
            StatsError::Json { text } => write!(f, "Archive JSON error: {text}"),
            StatsError::Evaluator { text } => write!(f, "Model evaluator failed: {text}"),
        }
    }
}

impl From<serde_json::Error> for StatsError {
    fn from(err: serde_json::Error) -> Self {
        StatsError::Json { text: err.to_string() }
    }
}

impl StatsError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        StatsError::Io { path: path.display().to_string(), text: err.to_string() }
    }
}
