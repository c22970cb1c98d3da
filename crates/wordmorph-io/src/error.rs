//! Error types for wordmorph-io

use thiserror::Error;

/// I/O error type
#[derive(Error, Debug)]
pub enum IoError {
    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] wordmorph_core::Error),

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not a binary PGM
    #[error("'{path}': unsupported format (expected P5 PGM, found '{magic}')")]
    UnsupportedFormat { path: String, magic: String },

    /// PGM header could not be parsed
    #[error("'{path}': malformed PGM header: {reason}")]
    MalformedHeader { path: String, reason: String },

    /// Word metadata missing or ambiguous
    #[error("'{path}': {reason}; need a 'label' property or exactly three comments (threshold, label, page)")]
    BadMetadata { path: String, reason: String },

    /// Gray pixel data without a threshold to binarize it
    #[error("'{path}': gray pixel data but no threshold in the metadata")]
    GrayWithoutThreshold { path: String },
}

/// Result type alias for I/O operations
pub type IoResult<T> = std::result::Result<T, IoError>;
