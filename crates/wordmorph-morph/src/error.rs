//! Error types for wordmorph-morph

use thiserror::Error;

/// Morph engine error type
#[derive(Error, Debug)]
pub enum MorphError {
    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] wordmorph_core::Error),

    /// Feature extraction error
    #[error(transparent)]
    Feature(#[from] wordmorph_features::FeatureError),

    /// Alignment error
    #[error(transparent)]
    Align(#[from] wordmorph_align::AlignError),

    /// An operation was called in the wrong engine state
    #[error("invalid engine state: {0} requires {1}")]
    InvalidState(&'static str, &'static str),
}

/// Result type alias for morph operations
pub type MorphResult<T> = std::result::Result<T, MorphError>;
