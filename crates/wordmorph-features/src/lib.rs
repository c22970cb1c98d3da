//! Wordmorph Features - per-column word-image descriptors
//!
//! Extracts the column-profile feature vectors ([`ColumnFeatures`]) that the
//! alignment crate warps against each other. One vector is extracted per
//! image and reused for every comparison involving that image.

pub mod error;
pub mod profile;

pub use error::{FeatureError, FeatureResult};
pub use profile::{ColumnFeatures, NUM_FEATURES};
