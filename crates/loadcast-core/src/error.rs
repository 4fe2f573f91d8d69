//! Unified error types for the loadcast pipeline.
//!
//! This module provides a common error type [`LoadcastError`] that can
//! represent failures from any stage of the pipeline. Stage-specific
//! conditions (empty input series, unusable grids, estimator failures) get
//! dedicated variants so callers can match on them at API boundaries.

use thiserror::Error;

/// Unified error type for all loadcast operations.
///
/// Fatal data-shape problems (`EmptySeries`, `InsufficientData`) are raised at
/// the boundary where they are detected; degraded-but-usable situations (lag
/// trimming, an empty validation split) are logged and never surface here.
#[derive(Error, Debug)]
pub enum LoadcastError {
    /// The input series had no observations to normalize.
    #[error("empty series: no observations to normalize")]
    EmptySeries,

    /// The hourly grid had no usable rows after gap filling.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The estimator failed mid-recursion; no partial forecast is returned.
    #[error("forecast failed: {0}")]
    Forecast(String),

    /// Data validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors (file access, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing/deserialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using LoadcastError.
pub type LoadcastResult<T> = Result<T, LoadcastError>;

impl From<anyhow::Error> for LoadcastError {
    fn from(err: anyhow::Error) -> Self {
        LoadcastError::Other(err.to_string())
    }
}

impl From<String> for LoadcastError {
    fn from(s: String) -> Self {
        LoadcastError::Other(s)
    }
}

impl From<&str> for LoadcastError {
    fn from(s: &str) -> Self {
        LoadcastError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for LoadcastError {
    fn from(err: serde_json::Error) -> Self {
        LoadcastError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LoadcastError::Forecast("estimator not fitted".into());
        assert!(err.to_string().contains("forecast failed"));
        assert!(err.to_string().contains("estimator not fitted"));
    }

    #[test]
    fn test_empty_series_display() {
        let err = LoadcastError::EmptySeries;
        assert!(err.to_string().contains("no observations"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LoadcastError = io_err.into();
        assert!(matches!(err, LoadcastError::Io(_)));
    }

    #[test]
    fn test_question_mark_operator() {
        fn inner() -> LoadcastResult<()> {
            Err(LoadcastError::Validation("test".into()))
        }

        fn outer() -> LoadcastResult<()> {
            inner()?;
            Ok(())
        }

        assert!(outer().is_err());
    }
}
