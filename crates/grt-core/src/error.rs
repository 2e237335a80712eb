//! Unified error types for the grt ecosystem
//!
//! This module provides a common error type [`GrtError`] that can represent
//! errors from any part of the pipeline. Domain-specific error types can be
//! converted to `GrtError` for uniform error handling at API boundaries.

use thiserror::Error;

/// Unified error type for all grt operations.
///
/// The variants mirror the pipeline's failure taxonomy: configuration
/// mistakes and data-consistency violations abort a stage immediately, solver
/// failures carry the raw backend status, and everything else is wrapped for
/// uniform reporting.
#[derive(Error, Debug)]
pub enum GrtError {
    /// I/O errors (file access, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Solver/algorithm errors
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network structure errors
    #[error("Network error: {0}")]
    Network(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using GrtError.
pub type GrtResult<T> = Result<T, GrtError>;

// Conversion from anyhow::Error
impl From<anyhow::Error> for GrtError {
    fn from(err: anyhow::Error) -> Self {
        GrtError::Other(err.to_string())
    }
}

impl From<String> for GrtError {
    fn from(s: String) -> Self {
        GrtError::Other(s)
    }
}

impl From<&str> for GrtError {
    fn from(s: &str) -> Self {
        GrtError::Other(s.to_string())
    }
}

// JSON parsing errors
impl From<serde_json::Error> for GrtError {
    fn from(err: serde_json::Error) -> Self {
        GrtError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GrtError::Config("unknown algorithm `voronoi`".into());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("voronoi"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let grt_err: GrtError = io_err.into();
        assert!(matches!(grt_err, GrtError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> GrtResult<()> {
            Err(GrtError::Validation("test".into()))
        }

        fn outer() -> GrtResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
