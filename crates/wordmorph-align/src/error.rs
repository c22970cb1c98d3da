//! Error types for wordmorph-align

use thiserror::Error;

/// Alignment error type
#[derive(Error, Debug)]
pub enum AlignError {
    /// One of the input sequences has no columns
    #[error("cannot align an empty feature sequence ({0} vs {1} columns)")]
    EmptySequence(usize, usize),
}

/// Result type alias for alignment operations
pub type AlignResult<T> = std::result::Result<T, AlignError>;
