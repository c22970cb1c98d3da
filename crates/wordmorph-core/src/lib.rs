//! Wordmorph Core - Basic data structures for word-image matching
//!
//! This crate provides the data structures shared by the rest of the
//! workspace:
//!
//! - [`BitonalImage`] - bitonal word image with word metadata
//! - [`DistanceField`] - signed Manhattan distance transform
//! - [`Error`] / [`Result`] - the core error type
//!
//! The matching engines (feature extraction, DTW alignment, mesh morphing,
//! cluster search) live in the downstream crates and only ever borrow the
//! types defined here.

pub mod bitonal;
pub mod distance;
pub mod error;

pub use bitonal::{BACKGROUND, BitonalImage, INK};
pub use distance::DistanceField;
pub use error::{Error, Result};
