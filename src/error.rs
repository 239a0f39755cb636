//! Error types for the landing prediction pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, LandingError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum LandingError {
    /// A required column is missing or has the wrong shape
    #[error("Schema error: {0}")]
    Schema(String),

    /// Too few rows, or too few examples of a label class
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    /// Network, timeout or malformed response from the launch data service
    #[error("External source error: {0}")]
    ExternalSource(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LandingError {
    /// Shorthand for a missing column
    pub fn missing_column(name: &str) -> Self {
        LandingError::Schema(format!("required column '{}' is missing", name))
    }

    /// Whether the error should abort the pipeline run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LandingError::ExternalSource(_))
    }
}

impl From<polars::error::PolarsError> for LandingError {
    fn from(err: polars::error::PolarsError) -> Self {
        LandingError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for LandingError {
    fn from(err: serde_json::Error) -> Self {
        LandingError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for LandingError {
    fn from(err: ndarray::ShapeError) -> Self {
        LandingError::Shape {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for LandingError {
    fn from(err: reqwest::Error) -> Self {
        LandingError::ExternalSource(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LandingError::missing_column("Class");
        assert_eq!(err.to_string(), "Schema error: required column 'Class' is missing");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LandingError = io_err.into();
        assert!(matches!(err, LandingError::Io(_)));
    }

    #[test]
    fn test_external_source_not_fatal() {
        assert!(!LandingError::ExternalSource("timeout".into()).is_fatal());
        assert!(LandingError::InsufficientData("empty".into()).is_fatal());
    }
}
