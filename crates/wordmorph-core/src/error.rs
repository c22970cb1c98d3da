//! Error types for wordmorph-core
//!
//! Provides a unified error type for the core data structures. Each variant
//! captures enough context (dimensions, indices, expected vs actual) to
//! reproduce the failing call without a debugger.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid image dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimension { width: u32, height: u32 },

    /// Pixel buffer length does not match width * height
    #[error("pixel buffer length mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Image is not bitonal (contains values other than ink/background)
    #[error("image is not bitonal: pixel ({x},{y}) has value {value}")]
    NotBitonal { x: u32, y: u32, value: u8 },

    /// Incompatible image sizes
    #[error("incompatible image sizes: {0}x{1} vs {2}x{3}")]
    IncompatibleSizes(u32, u32, u32, u32),

    /// Index out of bounds
    #[error("index out of bounds: {index} >= {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Required word metadata is missing
    #[error("missing required metadata field '{field}' on image '{image}'")]
    MissingMetadata { image: String, field: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;
