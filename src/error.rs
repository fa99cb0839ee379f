//! Error types for tupelo operations.
//!
//! Index construction and persistence are all-or-nothing: any error aborts
//! the operation and leaves no partially usable index behind. Searches do
//! not fail on bad candidates (those are filtered by the final distance
//! check), so the only search-time failures are oracle failures.

use std::io;
use thiserror::Error;

/// Result type alias using [`TupeloError`].
pub type Result<T> = std::result::Result<T, TupeloError>;

/// Errors that can occur during tupelo operations.
#[derive(Error, Debug)]
pub enum TupeloError {
    /// Invalid parameter value provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A parameter name that the receiving operation does not recognize.
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    /// Two synonymous parameters were both specified.
    #[error("conflicting parameters: {first} and {second} are synonyms, specify only one")]
    ConflictingParameters {
        /// First of the synonymous names.
        first: &'static str,
        /// Second of the synonymous names.
        second: &'static str,
    },

    /// The dataset or pivot file holds fewer points than required.
    #[error("insufficient points: required {required}, got {actual}")]
    InsufficientPoints {
        /// Minimum number of points required.
        required: usize,
        /// Actual number of points available.
        actual: usize,
    },

    /// A loaded index is inconsistent with the current dataset.
    #[error("data mismatch: {0}")]
    DataMismatch(String),

    /// Index file has an invalid or unrecognized layout.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Operation not supported by this space or index.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// Failure reported by an external pivot-distance oracle.
    #[error("pivot distance oracle error: {0}")]
    Oracle(String),
}

impl TupeloError {
    /// Creates a new `InvalidParameter` error.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Creates a new `DataMismatch` error.
    pub fn data_mismatch(msg: impl Into<String>) -> Self {
        Self::DataMismatch(msg.into())
    }

    /// Creates a new `InvalidFormat` error.
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Creates a new `NotSupported` error.
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Creates a new `Oracle` error.
    pub fn oracle(msg: impl Into<String>) -> Self {
        Self::Oracle(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TupeloError::invalid_parameter("pivotCombQty must be 1, 2, or 3");
        assert_eq!(
            err.to_string(),
            "invalid parameter: pivotCombQty must be 1, 2, or 3"
        );

        let err = TupeloError::ConflictingParameters {
            first: "numPrefix",
            second: "numPivotIndex",
        };
        assert!(err.to_string().contains("synonyms"));

        let err = TupeloError::InsufficientPoints {
            required: 512,
            actual: 100,
        };
        assert_eq!(err.to_string(), "insufficient points: required 512, got 100");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: TupeloError = io_err.into();
        assert!(matches!(err, TupeloError::Io(_)));
    }
}
