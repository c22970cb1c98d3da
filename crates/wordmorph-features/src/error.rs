//! Error types for wordmorph-features

use thiserror::Error;

/// Feature extraction error type
///
/// Feature dimensionality mismatches cannot occur here: every
/// `ColumnFeatures` carries the same fixed feature count by construction,
/// so the only failures are core-image contract violations.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] wordmorph_core::Error),
}

/// Result type alias for feature operations
pub type FeatureResult<T> = std::result::Result<T, FeatureError>;
