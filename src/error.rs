use std::path::PathBuf;

/// Result type for training operations
pub type Result<T> = std::result::Result<T, DqnError>;

/// Main error type for the crate
#[derive(Debug, thiserror::Error)]
pub enum DqnError {
    /// Invalid dimensions for operations
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: String,
        actual: String,
    },

    /// Invalid parameter value
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        name: String,
        reason: String,
    },

    /// Raised by an environment implementation; passed through training untouched
    #[error("environment error: {0}")]
    Environment(String),

    /// A training step was driven out of order
    #[error("training error: {0}")]
    Training(String),

    /// Configuration file could not be read or parsed
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("image error: {0}")]
    Image(String),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Failures while restoring a model checkpoint.
///
/// Callers usually treat every variant as recoverable: training can proceed
/// from freshly initialized parameters.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no checkpoint at {0}")]
    NotFound(PathBuf),

    #[error("checkpoint at {path} is unusable: {reason}")]
    Corrupt {
        path: PathBuf,
        reason: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<bincode::Error> for DqnError {
    fn from(err: bincode::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for DqnError {
    fn from(err: ndarray::ShapeError) -> Self {
        DqnError::DimensionMismatch {
            expected: "a compatible shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DqnError {
    fn from(err: serde_json::Error) -> Self {
        DqnError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DqnError {
    fn from(err: serde_yaml::Error) -> Self {
        DqnError::Config(err.to_string())
    }
}

impl From<image::ImageError> for DqnError {
    fn from(err: image::ImageError) -> Self {
        DqnError::Image(err.to_string())
    }
}

// Helper functions for common error patterns
impl DqnError {
    pub fn dimension_mismatch<S: Into<String>>(expected: S, actual: S) -> Self {
        DqnError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn invalid_parameter<S: Into<String>>(name: S, reason: S) -> Self {
        DqnError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn environment<S: Into<String>>(msg: S) -> Self {
        DqnError::Environment(msg.into())
    }
}
