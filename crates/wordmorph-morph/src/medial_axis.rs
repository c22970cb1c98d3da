//! Medial axis extraction
//!
//! The medial axis approximates the centerline of ink strokes. It is found
//! as the set of local minima of the signed Manhattan distance field: ink
//! pixels whose distance value is no greater than any 4-connected neighbor's.
//! A thinning pass then breaks up 2x2 blocks of axis pixels, which the local
//! minimum test leaves behind on strokes of even width.
//!
//! The point set is computed once per image and reused by every comparison
//! that warps this image onto another.

use crate::error::MorphResult;
use wordmorph_core::{BitonalImage, DistanceField};

/// Distance-field clamp used for skeleton extraction.
const AXIS_DIST_CLAMP: i32 = 10_000;

/// Sparse skeleton sample points of one word image.
#[derive(Debug, Clone)]
pub struct MedialAxisPoints {
    points: Vec<(u32, u32)>,
}

impl MedialAxisPoints {
    /// Extract the medial axis of a bitonal image.
    ///
    /// An image without ink yields an empty point set; callers treat that as
    /// a degenerate case (sentinel cost), not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the image carries gray values.
    pub fn extract(img: &BitonalImage) -> MorphResult<Self> {
        let field = DistanceField::compute(img, AXIS_DIST_CLAMP, -AXIS_DIST_CLAMP)?;
        Ok(Self::from_distance_field(&field))
    }

    /// Extract the medial axis from a precomputed distance field.
    pub fn from_distance_field(field: &DistanceField) -> Self {
        let w = field.width() as usize;
        let h = field.height() as usize;
        let d = field.values();
        let mut on = vec![false; w * h];

        for y in 0..h {
            // edge rows/cols compare against themselves via a zero offset
            let n = if y > 0 { y - 1 } else { y };
            let s = if y + 1 < h { y + 1 } else { y };
            for x in 0..w {
                let idx = y * w + x;
                if d[idx] > 0 {
                    continue;
                }
                let west = if x > 0 { x - 1 } else { x };
                let east = if x + 1 < w { x + 1 } else { x };
                if d[idx] <= d[n * w + x]
                    && d[idx] <= d[y * w + west]
                    && d[idx] <= d[y * w + east]
                    && d[idx] <= d[s * w + x]
                {
                    on[idx] = true;
                }
            }
        }

        // thinning: clear the lower-right pixel of any fully-set 2x2 block
        for y in 1..h {
            for x in 1..w {
                let idx = y * w + x;
                if on[idx] && on[idx - 1] && on[idx - w] && on[idx - w - 1] {
                    on[idx] = false;
                }
            }
        }

        let points = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .filter(|&(x, y)| on[y * w + x])
            .map(|(x, y)| (x as u32, y as u32))
            .collect();
        MedialAxisPoints { points }
    }

    /// The skeleton sample points as `(x, y)` pixel coordinates.
    #[inline]
    pub fn points(&self) -> &[(u32, u32)] {
        &self.points
    }

    /// Number of skeleton points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the skeleton is empty (image had no ink).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
