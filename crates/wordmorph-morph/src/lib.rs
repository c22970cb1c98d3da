//! Wordmorph Morph - mesh-warp morph cost engine
//!
//! Produces the scalar morph cost between two word images that drives both
//! pairwise matching and nearest-neighbor classification:
//!
//! - [`MedialAxisPoints`] - stroke centerline samples of the source image
//! - [`ControlPointGrid`] - the fixed and deformable control meshes
//! - [`MorphEngine`] - DTW-seeded, distance-field-guided mesh refinement,
//!   with full ([`MorphEngine::word_morph_cost`]) and fast
//!   ([`MorphEngine::word_morph_cost_fast`]) pipelines

pub mod engine;
pub mod error;
pub mod grid;
pub mod medial_axis;

pub use engine::{MorphEngine, MorphParams, MorphState, SENTINEL_COST};
pub use error::{MorphError, MorphResult};
pub use grid::ControlPointGrid;
pub use medial_axis::MedialAxisPoints;
