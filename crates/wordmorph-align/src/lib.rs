//! Wordmorph Align - banded dynamic-time-warping alignment
//!
//! Aligns the column features of two word images inside a Sakoe-Chiba band
//! and exposes the alignment path and its normalized cost. The morph engine
//! uses the path's column mapping to seed its deformable mesh; the alignment
//! cost is also a usable (coarse) word-similarity measure on its own.

pub mod dtw;
pub mod error;

pub use dtw::{AlignParams, Alignment, PathStep, align};
pub use error::{AlignError, AlignResult};
