//! Column profile features
//!
//! Extracts the four Rath/Manmatha-style per-column descriptors used as the
//! alignment signal for dynamic time warping:
//!
//! 1. ink-density profile (ink pixels per column)
//! 2. upper profile (row of the topmost ink pixel)
//! 3. lower profile (distance from the bottom edge to the lowest ink pixel)
//! 4. background-to-ink transition count (scanning down the column)
//!
//! Columns without ink get their boundary profiles linearly interpolated from
//! the nearest inked neighbors so the sequences stay smooth. Each feature is
//! then independently normalized to [0, 1] by its maximum. The vector length
//! equals the image width.

use crate::error::FeatureResult;
use wordmorph_core::BitonalImage;

/// Number of per-column features.
pub const NUM_FEATURES: usize = 4;

/// Per-column feature vectors for one word image.
///
/// Storage is grouped by feature: feature `k` occupies
/// `data[k * len .. (k + 1) * len]`.
#[derive(Debug, Clone)]
pub struct ColumnFeatures {
    len: usize,
    data: Vec<f64>,
}

impl ColumnFeatures {
    /// Extract column features from a bitonal word image.
    ///
    /// An image without any ink is degenerate but not an error: all four
    /// features come back zeroed and downstream costs see maximal mismatch
    /// against real words.
    ///
    /// # Errors
    ///
    /// Returns an error if the image carries gray values.
    pub fn extract(img: &BitonalImage) -> FeatureResult<Self> {
        img.check_bitonal()?;
        let w = img.width() as usize;
        let h = img.height() as usize;
        let mut data = vec![0.0f64; NUM_FEATURES * w];
        let (profile, rest) = data.split_at_mut(w);
        let (upper, rest) = rest.split_at_mut(w);
        let (lower, trans) = rest.split_at_mut(w);

        const NO_INK: f64 = f64::MAX;
        upper.fill(NO_INK);
        lower.fill(NO_INK);

        for y in 0..h {
            for x in 0..w {
                if !img.is_ink(x as u32, y as u32) {
                    continue;
                }
                profile[x] += 1.0;
                if (y as f64) < upper[x] {
                    upper[x] = y as f64;
                }
                let from_bottom = (h - y) as f64;
                if from_bottom < lower[x] {
                    lower[x] = from_bottom;
                }
                if y == 0 || !img.is_ink(x as u32, (y - 1) as u32) {
                    trans[x] += 1.0;
                }
            }
        }

        interpolate_gaps(upper, NO_INK);
        interpolate_gaps(lower, NO_INK);

        normalize(profile);
        normalize(upper);
        normalize(lower);
        normalize(trans);

        Ok(ColumnFeatures { len: w, data })
    }

    /// Number of columns (= image width).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the vector has zero columns.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of features per column.
    #[inline]
    pub fn dims(&self) -> usize {
        NUM_FEATURES
    }

    /// Get one feature sequence (`k < NUM_FEATURES`).
    ///
    /// # Panics
    ///
    /// Panics if `k >= NUM_FEATURES`.
    #[inline]
    pub fn feature(&self, k: usize) -> &[f64] {
        assert!(k < NUM_FEATURES);
        &self.data[k * self.len..(k + 1) * self.len]
    }

    /// Squared Euclidean distance between column `i` of `self` and column `j`
    /// of `other`, across all features.
    ///
    /// # Panics
    ///
    /// Panics if `i` or `j` is out of range.
    #[inline]
    pub fn column_sq_dist(&self, i: usize, other: &ColumnFeatures, j: usize) -> f64 {
        assert!(i < self.len && j < other.len);
        let mut d = 0.0;
        for k in 0..NUM_FEATURES {
            let a = self.data[k * self.len + i];
            let b = other.data[k * other.len + j];
            d += (a - b) * (a - b);
        }
        d
    }
}

/// Linearly interpolate runs of `missing` values from the nearest known
/// neighbors; leading/trailing runs are held at the nearest known value.
/// A sequence with no known value at all is zeroed.
fn interpolate_gaps(seq: &mut [f64], missing: f64) {
    let first_known = seq.iter().position(|&v| v != missing);
    let Some(first_known) = first_known else {
        seq.fill(0.0);
        return;
    };
    let w = seq.len();
    for x in 0..first_known {
        seq[x] = seq[first_known];
    }
    let mut x = first_known + 1;
    while x < w {
        if seq[x] != missing {
            x += 1;
            continue;
        }
        let prev = x - 1;
        let mut next = x + 1;
        while next < w && seq[next] == missing {
            next += 1;
        }
        if next >= w {
            for i in x..w {
                seq[i] = seq[prev];
            }
            return;
        }
        let (a, b) = (seq[prev], seq[next]);
        let span = (next - prev) as f64;
        for i in x..next {
            let s = (i - prev) as f64 / span;
            seq[i] = (1.0 - s) * a + s * b;
        }
        x = next + 1;
    }
}

/// Scale a sequence into [0, 1] by its maximum. A zero maximum leaves the
/// sequence untouched rather than dividing by zero.
fn normalize(seq: &mut [f64]) {
    let max = seq.iter().cloned().fold(0.0f64, f64::max);
    if max > 0.0 {
        for v in seq.iter_mut() {
            *v /= max;
        }
    }
}
