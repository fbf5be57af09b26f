//! Error types for outlier pipelines
//!
//! Provides a unified error type for all outlier-stream crates.

use thiserror::Error;

/// Core error type for pipeline operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration option, detected at initialization
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stage or stream was used outside its contract
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} records, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// IO error (dump sinks, ingestion files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for a required option that was not supplied
    pub fn missing_option(option: &str) -> Self {
        Self::Configuration(format!("missing required option `{option}`"))
    }

    /// Create an error for an option whose value is out of range
    pub fn invalid_option(option: &str, reason: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("invalid value for `{option}`: {reason}"))
    }

    /// Create an error for a stream drained twice
    pub fn redrain(stream: &str) -> Self {
        Self::ContractViolation(format!("{stream} stream drained more than once"))
    }

    /// Create an error for a time column that the record does not have
    pub fn time_column_out_of_range(column: usize, dimensions: usize) -> Self {
        Self::InvalidInput(format!(
            "time column {column} out of range for record with {dimensions} metrics"
        ))
    }

    /// Create an error for a dimension mismatch between records
    pub fn dimension_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Dimension mismatch in {context}: expected {expected}, got {actual}"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Configuration("window_size must be positive".to_string());
        assert_eq!(err.to_string(), "Configuration error: window_size must be positive");

        let err = Error::ContractViolation("consume after shutdown".to_string());
        assert_eq!(err.to_string(), "Contract violation: consume after shutdown");

        let err = Error::InsufficientData { expected: 2, actual: 0 };
        assert_eq!(err.to_string(), "Insufficient data: expected at least 2 records, got 0");
    }

    #[test]
    fn test_error_helper_functions() {
        let err = Error::missing_option("window_size");
        assert_eq!(err.to_string(), "Configuration error: missing required option `window_size`");

        let err = Error::invalid_option("slide_size", "must not exceed window_size");
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid value for `slide_size`: must not exceed window_size"
        );

        let err = Error::redrain("classifier");
        assert!(matches!(err, Error::ContractViolation(_)));

        let err = Error::time_column_out_of_range(3, 2);
        assert_eq!(
            err.to_string(),
            "Invalid input: time column 3 out of range for record with 2 metrics"
        );
    }

    #[test]
    fn test_error_from_io_error() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => assert!(err.to_string().contains("read-only")),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_error_from_anyhow() {
        let err: Error = anyhow::anyhow!("ingester went away").into();
        assert!(matches!(err, Error::Other(_)));
        assert!(err.to_string().contains("ingester went away"));
    }
}
