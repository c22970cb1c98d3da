//! Wordmorph - elastic word-image matching and recognition
//!
//! Computes a similarity metric between handwritten-word images by
//! elastically warping one onto the other, and classifies query words
//! against a labeled training set with a branch-and-bound search over a
//! cluster tree built from that metric.
//!
//! # Overview
//!
//! The pipeline for one image pair:
//!
//! 1. extract per-column features and align them with banded DTW
//! 2. seed a deformable control-point mesh from the alignment
//! 3. iteratively refine the mesh against the target's distance field
//! 4. score the warped skeleton of one word against the other's ink
//!
//! For classification, the pairwise cost fills an N x N training matrix
//! (threaded, persisted to disk), the matrix is clustered into a binary
//! tree, and each query walks the tree with an admissible pruning bound,
//! followed by a full-cost confirmation pass over the best candidates.
//!
//! # Example
//!
//! ```
//! use wordmorph::{BitonalImage, INK};
//! use wordmorph::morph::{MorphEngine, MorphParams};
//!
//! let mut a = BitonalImage::new(40, 20).unwrap();
//! a.fill_rect(2, 9, 36, 2, INK);
//! let cost = MorphEngine::word_morph_cost(&a, &a, &MorphParams::default()).unwrap();
//! assert_eq!(cost, 0.0);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use wordmorph_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use wordmorph_align as align;
pub use wordmorph_cluster as cluster;
pub use wordmorph_features as features;
pub use wordmorph_io as io;
pub use wordmorph_morph as morph;
