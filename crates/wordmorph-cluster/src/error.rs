//! Error types for wordmorph-cluster
//!
//! Persisted-state inconsistencies (bad matrix headers, range mismatches,
//! overlapping or missing chunks, malformed merge logs) are all fatal for
//! the load operation that hits them and carry the specific inconsistency;
//! nothing in this crate auto-repairs a file.

use thiserror::Error;

/// Clustering / search error type
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] wordmorph_core::Error),

    /// Error from the morph engine
    #[error(transparent)]
    Morph(#[from] wordmorph_morph::MorphError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Training set is empty
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// Matrix value buffer has the wrong length
    #[error("matrix buffer length mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Label slice does not pair up with the image slice
    #[error("label count mismatch: {labels} labels for {images} images")]
    LabelCountMismatch { labels: usize, images: usize },

    /// Matrix file header could not be decoded
    #[error("malformed matrix header in '{path}': {reason}")]
    HeaderMalformed { path: String, reason: String },

    /// Requested training range is not covered by the stored matrix
    #[error(
        "matrix file '{path}' stores training range {stored_first}..={stored_last}, \
         requested {requested_first}..={requested_last}"
    )]
    RangeMismatch {
        path: String,
        stored_first: usize,
        stored_last: usize,
        requested_first: usize,
        requested_last: usize,
    },

    /// Expected a full matrix file but found a chunk
    #[error("matrix file '{path}' is a chunk (rows {chunk_first}..={chunk_last}), not a full matrix")]
    NotFullMatrix {
        path: String,
        chunk_first: usize,
        chunk_last: usize,
    },

    /// A chunk belongs to a different training range than its siblings
    #[error(
        "chunk file '{path}' covers training range {actual_first}..={actual_last}, \
         expected {expected_first}..={expected_last}"
    )]
    ChunkRangeMismatch {
        path: String,
        expected_first: usize,
        expected_last: usize,
        actual_first: usize,
        actual_last: usize,
    },

    /// Two chunks cover the same matrix row
    #[error("chunk file '{path}' overlaps a previously merged chunk at row {row}")]
    ChunkOverlap { path: String, row: usize },

    /// Merging left matrix rows uncovered
    #[error("no chunk covers matrix rows {first}..={last}")]
    ChunkMissing { first: usize, last: usize },

    /// Merge log text could not be parsed
    #[error("malformed merge log '{path}' at line {line}: {reason}")]
    MergeLogMalformed {
        path: String,
        line: usize,
        reason: String,
    },

    /// Merge log was recorded for a different training count
    #[error("merge log '{path}' is for {stored} training words, expected {expected}")]
    MergeLogCountMismatch {
        path: String,
        stored: usize,
        expected: usize,
    },

    /// A replayed merge references a cluster index that no longer exists
    #[error("merge log entry {entry} references cluster {index}, but only {live} clusters are live")]
    MergeLogIndexOutOfRange {
        entry: usize,
        index: usize,
        live: usize,
    },
}

/// Result type alias for cluster operations
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;
