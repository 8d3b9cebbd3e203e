//! Error types for the barbell ensemble report

use thiserror::Error;

/// Result type alias for barbell operations
pub type Result<T> = std::result::Result<T, BarbellError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum BarbellError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate weights: accuracies sum to {total}, weights are undefined")]
    DegenerateWeights { total: f64 },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for BarbellError {
    fn from(err: polars::error::PolarsError) -> Self {
        BarbellError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for BarbellError {
    fn from(err: serde_json::Error) -> Self {
        BarbellError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for BarbellError {
    fn from(err: ndarray::ShapeError) -> Self {
        BarbellError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
