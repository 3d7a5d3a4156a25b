//! Error types for vocabulary construction, encoding and queries

use thiserror::Error;

/// What was wrong with a single key in caller-supplied input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyFault {
    /// A missing key (for example an absent cell in a loaded table)
    #[error("missing key at index {index}")]
    Null {
        /// Position of the element in the input sequence
        index: usize,
    },
    /// An empty or whitespace-only key
    #[error("blank key at index {index}")]
    Blank {
        /// Position of the element in the input sequence
        index: usize,
    },
}

/// Error type for fingerprint operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    /// The vocabulary could not be turned into an index
    #[error("invalid vocabulary: {reason}")]
    InvalidVocabulary {
        /// Human-readable description of the offending element
        reason: String,
    },
    /// Molecule data handed to a builder contained a bad key
    #[error("invalid input: {0}")]
    InvalidInput(#[from] KeyFault),
    /// A query position lies outside `[0, size)`
    #[error("position {position} out of range for fingerprint of size {size}")]
    IndexOutOfRange {
        /// The requested position, wide enough for any `usize` or `i64`
        position: i128,
        /// Dimension of the vocabulary
        size: usize,
    },
    /// A deliberately unimplemented operation
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl FingerprintError {
    pub(crate) fn out_of_range(position: i128, size: usize) -> Self {
        FingerprintError::IndexOutOfRange { position, size }
    }
}

/// Result type for fingerprint operations
pub type Result<T> = std::result::Result<T, FingerprintError>;
