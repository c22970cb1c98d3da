//! Mesh-warp morph cost engine
//!
//! Computes a scalar morph cost between two word images by elastically
//! warping the first onto the second. Each image gets a control-point grid:
//! `grid0` is axis-aligned over image 0 and fixed, `grid1` is deformed over
//! image 1. The skeleton of image 0 is carried through the warp and scored
//! against the distance field of image 1, so the cost measures how far the
//! warped ink of one word lands from the ink of the other.
//!
//! The engine moves through four states:
//!
//! ```text
//! Uninitialized -> CoarseAligned -> Refining -> Converged
//! ```
//!
//! - construction builds the grids, the distance field of image 1 and the
//!   medial axis of image 0
//! - [`MorphEngine::coarse_align`] seeds `grid1` horizontally from a banded
//!   DTW alignment of the two column-feature sequences
//! - [`MorphEngine::improve_until`] runs coordinate-descent sweeps, moving
//!   each interior control point to the best position in a small candidate
//!   neighborhood
//! - [`MorphEngine::refine_meshes`] subdivides both grids for a finer pass
//!
//! Alternating improve/refine cycles is the auto-morph schedule used by
//! [`MorphEngine::word_morph_cost`]; [`MorphEngine::word_morph_cost_fast`]
//! is the cheaper variant (coarser mesh, fewer cycles) used for first-pass
//! classification and as the tree-search oracle.
//!
//! The per-vertex relocation is a local hill-climb: there is no global
//! optimality guarantee, only the identity bound (an image morphed onto an
//! exact copy of itself costs 0) and non-negativity.

use crate::error::{MorphError, MorphResult};
use crate::grid::ControlPointGrid;
use crate::medial_axis::MedialAxisPoints;
use wordmorph_align::{AlignParams, align};
use wordmorph_core::{BitonalImage, DistanceField};
use wordmorph_features::ColumnFeatures;

/// Distance-field clamp used for morph cost evaluation.
const DIST_CLAMP: i32 = 10_000;

/// Cost returned for degenerate comparisons (image 0 has no ink).
pub const SENTINEL_COST: f64 = 999_999.0;

/// Smallest allowed mesh spacing in pixels.
const MIN_MESH_SPACING: f64 = 4.0;

/// Sweep iteration caps for the full and fast pipelines.
const IMPROVE_CAP_FULL: u32 = 16;
const IMPROVE_CAP_FAST: u32 = 8;

/// Refinement cycle defaults for the full and fast pipelines.
const REFINES_FULL: u32 = 2;
const REFINES_FAST: u32 = 1;

/// Stop sweeping once a full sweep improves total cost by less than this.
const IMPROVE_EPSILON: f64 = 0.05;

/// Tuning parameters for the morph pipeline.
#[derive(Debug, Clone)]
pub struct MorphParams {
    /// Sakoe-Chiba band half-width for the DTW coarse alignment.
    pub band_radius: u32,
    /// Penalty for DTW cells outside the band.
    pub band_penalty: f64,
    /// Extra DTW cost for non-diagonal moves.
    pub non_diagonal_cost: f64,
    /// Static mesh spacing in pixels; `None` derives it from `mesh_div`.
    pub mesh_spacing: Option<u32>,
    /// Static refinement cycle count; `None` uses the per-variant default.
    pub refinements: Option<u32>,
    /// Image-0 height is divided by this to derive the auto mesh spacing.
    pub mesh_div: f64,
    /// Added to the final cost as `penalty * |width0 - width1|`.
    pub length_mismatch_penalty: f64,
    /// Stop after the DTW coarse alignment and score the unrefined mesh.
    /// Much cheaper and much less accurate; useful as a baseline.
    pub coarse_only: bool,
}

impl Default for MorphParams {
    fn default() -> Self {
        MorphParams {
            band_radius: 15,
            band_penalty: 1000.0,
            non_diagonal_cost: 0.0,
            mesh_spacing: None,
            refinements: None,
            mesh_div: 4.0,
            length_mismatch_penalty: 0.0,
            coarse_only: false,
        }
    }
}

/// Pipeline state of a [`MorphEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphState {
    /// Grids built, no alignment applied yet.
    Uninitialized,
    /// `grid1` seeded from the DTW column mapping.
    CoarseAligned,
    /// At least one improvement sweep has run.
    Refining,
    /// The pipeline produced its final cost.
    Converged,
}

/// Morph cost engine for one ordered image pair.
///
/// Borrows both images for its whole lifetime; all derived state
/// (distance field, medial axis, grids, per-point quad cache) is owned.
pub struct MorphEngine<'a> {
    img0: &'a BitonalImage,
    img1: &'a BitonalImage,
    params: MorphParams,
    dist1: DistanceField,
    ma0: MedialAxisPoints,
    grid0: ControlPointGrid,
    grid1: ControlPointGrid,
    col_spacing: f64,
    row_spacing: f64,
    state: MorphState,
    dp_cost: Option<f64>,
    /// Per medial-axis point: containing quad and fraction within it,
    /// located once per mesh level against the fixed `grid0`.
    point_quads: Vec<(usize, usize, f64, f64)>,
    /// Medial-axis point indices per quad, row-major `(rows-1) x (cols-1)`.
    quad_points: Vec<Vec<usize>>,
}

impl<'a> MorphEngine<'a> {
    /// Create an engine with the auto-derived (full pipeline) mesh spacing.
    pub fn new(
        img0: &'a BitonalImage,
        img1: &'a BitonalImage,
        params: &MorphParams,
    ) -> MorphResult<Self> {
        let spacing = Self::base_spacing(img0, params);
        Self::with_spacing(img0, img1, params, spacing)
    }

    /// Create an engine with an explicit mesh spacing in pixels.
    pub fn with_spacing(
        img0: &'a BitonalImage,
        img1: &'a BitonalImage,
        params: &MorphParams,
        spacing: f64,
    ) -> MorphResult<Self> {
        let spacing = spacing.max(MIN_MESH_SPACING);
        let dist1 = DistanceField::compute(img1, DIST_CLAMP, -DIST_CLAMP)?;
        let ma0 = MedialAxisPoints::extract(img0)?;
        let grid0 = ControlPointGrid::axis_aligned(img0.width(), img0.height(), spacing, spacing);
        let grid1 = grid0.clone();
        let mut engine = MorphEngine {
            img0,
            img1,
            params: params.clone(),
            dist1,
            ma0,
            grid0,
            grid1,
            col_spacing: spacing,
            row_spacing: spacing,
            state: MorphState::Uninitialized,
            dp_cost: None,
            point_quads: Vec::new(),
            quad_points: Vec::new(),
        };
        engine.locate_points();
        Ok(engine)
    }

    /// Mesh spacing the full pipeline derives from the parameters.
    fn base_spacing(img0: &BitonalImage, params: &MorphParams) -> f64 {
        match params.mesh_spacing {
            Some(s) => s as f64,
            None => (img0.height() as f64 / params.mesh_div).round().max(MIN_MESH_SPACING),
        }
    }

    /// Current pipeline state.
    pub fn state(&self) -> MorphState {
        self.state
    }

    /// Cost of the DTW coarse alignment, once it has run.
    pub fn dp_cost(&self) -> Option<f64> {
        self.dp_cost
    }

    /// Current grid dimensions (`rows`, `cols`).
    pub fn grid_dims(&self) -> (usize, usize) {
        (self.grid0.rows(), self.grid0.cols())
    }

    /// Locate every medial-axis point in the fixed grid once per mesh level.
    fn locate_points(&mut self) {
        let quad_cols = self.grid0.cols() - 1;
        let quad_rows = self.grid0.rows() - 1;
        self.point_quads.clear();
        self.quad_points = vec![Vec::new(); quad_rows * quad_cols];
        for (i, &(x, y)) in self.ma0.points().iter().enumerate() {
            let (qc, s) = self.grid0.locate_col(x as f64);
            let (qr, t) = self.grid0.locate_row(y as f64);
            self.point_quads.push((qr, qc, s, t));
            self.quad_points[qr * quad_cols + qc].push(i);
        }
    }

    /// Seed `grid1` from the DTW alignment of the two column profiles.
    ///
    /// Only x-coordinates move at this stage: each grid column is displaced
    /// to the image-1 column its image-0 column aligns with.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::InvalidState`] unless the engine is fresh, and
    /// propagates feature/alignment failures.
    pub fn coarse_align(&mut self) -> MorphResult<()> {
        if self.state != MorphState::Uninitialized {
            return Err(MorphError::InvalidState("coarse_align", "Uninitialized"));
        }
        let fv0 = ColumnFeatures::extract(self.img0)?;
        let fv1 = ColumnFeatures::extract(self.img1)?;
        let align_params = AlignParams {
            band_radius: self.params.band_radius,
            band_penalty: self.params.band_penalty,
            non_diagonal_cost: self.params.non_diagonal_cost,
        };
        let alignment = align(&fv0, &fv1, &align_params)?;
        let mapping = alignment.column_mapping();
        let w0 = self.img0.width() as usize;
        for c in 0..self.grid1.cols() {
            let x0 = self.grid0.x(0, c).round() as usize;
            let x1 = mapping[x0.min(w0 - 1)];
            for r in 0..self.grid1.rows() {
                let y = self.grid1.y(r, c);
                self.grid1.set(r, c, x1, y);
            }
        }
        self.dp_cost = Some(alignment.cost);
        self.state = MorphState::CoarseAligned;
        Ok(())
    }

    /// Warp cost of one medial-axis point under the current `grid1`.
    ///
    /// The point's warped position is looked up in image 1's distance field;
    /// positions on or inside ink charge nothing, background positions charge
    /// their distance, and positions outside the image are charged the
    /// clamped-edge value plus the overflow in each axis so the optimizer
    /// still sees a slope back toward the image.
    #[inline]
    fn point_cost(&self, i: usize) -> f64 {
        let (qr, qc, s, t) = self.point_quads[i];
        let (xp, yp) = self.grid1.warp_in_quad(qr, qc, s, t);
        let w1 = self.img1.width() as i32;
        let h1 = self.img1.height() as i32;
        // round, don't truncate: the warp of an unmoved mesh must land every
        // point back on its own pixel even when the bilinear arithmetic is
        // off by an ulp
        let mut ix = xp.round() as i32;
        let mut iy = yp.round() as i32;
        let mut overflow = 0i32;
        if ix < 0 {
            overflow -= ix;
            ix = 0;
        } else if ix > w1 - 1 {
            overflow += ix - (w1 - 1);
            ix = w1 - 1;
        }
        if iy < 0 {
            overflow -= iy;
            iy = 0;
        } else if iy > h1 - 1 {
            overflow += iy - (h1 - 1);
            iy = h1 - 1;
        }
        let d = self.dist1.get(ix as u32, iy as u32).max(0);
        (d + overflow) as f64
    }

    /// Mean warp cost over the medial-axis points in `pts` with the vertex
    /// `(r, c)` of `grid1` temporarily moved to `(x1, y1)`.
    fn vertex_cost(&mut self, r: usize, c: usize, x1: f64, y1: f64, pts: &[usize]) -> f64 {
        if pts.is_empty() {
            return 0.0;
        }
        let (sx, sy) = (self.grid1.x(r, c), self.grid1.y(r, c));
        self.grid1.set(r, c, x1, y1);
        let sum: f64 = pts.iter().map(|&i| self.point_cost(i)).sum();
        self.grid1.set(r, c, sx, sy);
        sum / pts.len() as f64
    }

    /// One coordinate-descent sweep over all interior control points.
    ///
    /// Each vertex is offered a 3x3 candidate neighborhood around its current
    /// position (step = a quarter of the current mesh spacing, at least one
    /// pixel); it moves to the strictly cheapest candidate, so ties keep the
    /// current position. Returns the total cost after the sweep.
    fn improve(&mut self) -> f64 {
        let rows = self.grid1.rows();
        let cols = self.grid1.cols();
        let quad_cols = cols - 1;
        let step_x = (self.col_spacing / 4.0).max(1.0);
        let step_y = (self.row_spacing / 4.0).max(1.0);
        for r in 1..rows - 1 {
            for c in 1..cols - 1 {
                // medial-axis points in the 4 quads incident to this vertex
                let mut pts: Vec<usize> = Vec::new();
                for (qr, qc) in [(r - 1, c - 1), (r - 1, c), (r, c - 1), (r, c)] {
                    pts.extend_from_slice(&self.quad_points[qr * quad_cols + qc]);
                }
                if pts.is_empty() {
                    continue;
                }
                let (x, y) = (self.grid1.x(r, c), self.grid1.y(r, c));
                let mut best_cost = self.vertex_cost(r, c, x, y, &pts);
                let mut best = (x, y);
                for dy in [-step_y, 0.0, step_y] {
                    for dx in [-step_x, 0.0, step_x] {
                        if dx == 0.0 && dy == 0.0 {
                            continue;
                        }
                        let cand = self.vertex_cost(r, c, x + dx, y + dy, &pts);
                        if cand < best_cost {
                            best_cost = cand;
                            best = (x + dx, y + dy);
                        }
                    }
                }
                self.grid1.set(r, c, best.0, best.1);
            }
        }
        self.total_cost()
    }

    /// Run improvement sweeps until the total cost stops improving by more
    /// than `epsilon` or `cap` sweeps have run. Returns the final total cost.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::InvalidState`] before [`Self::coarse_align`].
    pub fn improve_until(&mut self, cap: u32, epsilon: f64) -> MorphResult<f64> {
        if self.state == MorphState::Uninitialized {
            return Err(MorphError::InvalidState("improve_until", "CoarseAligned"));
        }
        self.state = MorphState::Refining;
        let mut prev = self.total_cost();
        for _ in 0..cap {
            let cost = self.improve();
            if prev - cost < epsilon {
                return Ok(cost);
            }
            prev = cost;
        }
        Ok(prev)
    }

    /// Subdivide both grids (every quad into 4) and relocate the medial-axis
    /// points in the finer mesh. New `grid1` points are interpolated from
    /// their quad and not yet optimized.
    ///
    /// # Errors
    ///
    /// Returns [`MorphError::InvalidState`] before [`Self::coarse_align`].
    pub fn refine_meshes(&mut self) -> MorphResult<()> {
        if self.state == MorphState::Uninitialized {
            return Err(MorphError::InvalidState("refine_meshes", "CoarseAligned"));
        }
        self.grid0.subdivide();
        self.grid1.subdivide();
        self.col_spacing /= 2.0;
        self.row_spacing /= 2.0;
        self.locate_points();
        Ok(())
    }

    /// Mean warp cost over all medial-axis points under the current `grid1`,
    /// without the length-mismatch penalty. [`SENTINEL_COST`] when image 0
    /// has no ink.
    pub fn total_cost(&self) -> f64 {
        if self.ma0.is_empty() {
            return SENTINEL_COST;
        }
        let sum: f64 = (0..self.ma0.len()).map(|i| self.point_cost(i)).sum();
        sum / self.ma0.len() as f64
    }

    /// Run the full auto-morph pipeline and return the scalar morph cost.
    ///
    /// Coarse alignment, then `refinements` cycles of
    /// (improve-to-convergence, mesh subdivision), then a final improvement
    /// pass; the result is the mean warp cost plus
    /// `length_mismatch_penalty * |width0 - width1|`.
    pub fn word_morph_cost(
        img0: &'a BitonalImage,
        img1: &'a BitonalImage,
        params: &MorphParams,
    ) -> MorphResult<f64> {
        let spacing = Self::base_spacing(img0, params);
        let refines = params.refinements.unwrap_or(REFINES_FULL);
        Self::run(img0, img1, params, spacing, refines, IMPROVE_CAP_FULL)
    }

    /// Cheaper variant of [`Self::word_morph_cost`]: twice the mesh spacing,
    /// fewer refinement cycles, shorter sweeps. Used for first-pass
    /// classification and as the tree-search cost oracle.
    pub fn word_morph_cost_fast(
        img0: &'a BitonalImage,
        img1: &'a BitonalImage,
        params: &MorphParams,
    ) -> MorphResult<f64> {
        let spacing = 2.0 * Self::base_spacing(img0, params);
        let refines = params.refinements.unwrap_or(REFINES_FAST);
        Self::run(img0, img1, params, spacing, refines, IMPROVE_CAP_FAST)
    }

    fn run(
        img0: &'a BitonalImage,
        img1: &'a BitonalImage,
        params: &MorphParams,
        spacing: f64,
        refines: u32,
        cap: u32,
    ) -> MorphResult<f64> {
        let mut engine = Self::with_spacing(img0, img1, params, spacing)?;
        if engine.ma0.is_empty() {
            return Ok(SENTINEL_COST);
        }
        engine.coarse_align()?;
        let cost = if params.coarse_only {
            engine.total_cost()
        } else {
            for _ in 0..refines {
                engine.improve_until(cap, IMPROVE_EPSILON)?;
                engine.refine_meshes()?;
            }
            engine.improve_until(cap, IMPROVE_EPSILON)?
        };
        engine.state = MorphState::Converged;
        let mismatch = (img0.width() as f64 - img1.width() as f64).abs();
        Ok(cost + params.length_mismatch_penalty * mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wordmorph_core::INK;

    /// A synthetic "word": a horizontal baseline stroke with vertical stems.
    fn word_image(width: u32, height: u32, stems: &[u32]) -> BitonalImage {
        let mut img = BitonalImage::new(width, height).unwrap();
        let base = height / 2;
        img.fill_rect(1, base, width - 2, 2, INK);
        for &s in stems {
            img.fill_rect(s, 2, 2, height - 4, INK);
        }
        img
    }

    #[test]
    fn test_identity_cost_is_zero() {
        let img = word_image(40, 20, &[5, 20, 33]);
        let p = MorphParams::default();
        let cost = MorphEngine::word_morph_cost(&img, &img, &p).unwrap();
        assert_eq!(cost, 0.0);
        let fast = MorphEngine::word_morph_cost_fast(&img, &img, &p).unwrap();
        assert_eq!(fast, 0.0);
    }

    #[test]
    fn test_cost_non_negative() {
        let a = word_image(40, 20, &[5, 20, 33]);
        let b = word_image(52, 20, &[8, 30]);
        let p = MorphParams::default();
        assert!(MorphEngine::word_morph_cost(&a, &b, &p).unwrap() >= 0.0);
        assert!(MorphEngine::word_morph_cost(&b, &a, &p).unwrap() >= 0.0);
        assert!(MorphEngine::word_morph_cost_fast(&a, &b, &p).unwrap() >= 0.0);
    }

    #[test]
    fn test_similar_words_cost_less_than_dissimilar() {
        let a = word_image(40, 20, &[5, 20, 33]);
        let similar = word_image(42, 20, &[6, 21, 34]);
        let different = word_image(40, 20, &[12]);
        let p = MorphParams::default();
        let c_sim = MorphEngine::word_morph_cost(&a, &similar, &p).unwrap();
        let c_diff = MorphEngine::word_morph_cost(&a, &different, &p).unwrap();
        assert!(
            c_sim < c_diff,
            "similar pair {c_sim} should beat dissimilar pair {c_diff}"
        );
    }

    #[test]
    fn test_coarse_only_mode() {
        let a = word_image(40, 20, &[5, 20, 33]);
        let b = word_image(46, 20, &[7, 24, 38]);
        let p = MorphParams {
            coarse_only: true,
            ..MorphParams::default()
        };
        // identity still costs zero without any refinement
        assert_eq!(MorphEngine::word_morph_cost(&a, &a, &p).unwrap(), 0.0);
        // refinement starts from the coarse mesh and only accepts
        // cost-reducing moves, so it can only improve on this
        let coarse = MorphEngine::word_morph_cost(&a, &b, &p).unwrap();
        let refined =
            MorphEngine::word_morph_cost(&a, &b, &MorphParams::default()).unwrap();
        assert!(coarse >= refined - 1e-9);
    }

    #[test]
    fn test_empty_ink_gives_sentinel() {
        let empty = BitonalImage::new(20, 20).unwrap();
        let word = word_image(20, 20, &[9]);
        let p = MorphParams::default();
        let cost = MorphEngine::word_morph_cost(&empty, &word, &p).unwrap();
        assert_eq!(cost, SENTINEL_COST);
    }

    #[test]
    fn test_length_mismatch_penalty() {
        let a = word_image(40, 20, &[5, 20]);
        let b = word_image(50, 20, &[5, 20]);
        let base = MorphParams::default();
        let penalized = MorphParams {
            length_mismatch_penalty: 1.0,
            ..MorphParams::default()
        };
        let c0 = MorphEngine::word_morph_cost(&a, &b, &base).unwrap();
        let c1 = MorphEngine::word_morph_cost(&a, &b, &penalized).unwrap();
        assert!((c1 - c0 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_state_machine_enforced() {
        let a = word_image(40, 20, &[5]);
        let b = word_image(40, 20, &[7]);
        let p = MorphParams::default();
        let mut e = MorphEngine::new(&a, &b, &p).unwrap();
        assert_eq!(e.state(), MorphState::Uninitialized);
        assert!(e.improve_until(4, 0.05).is_err());
        assert!(e.refine_meshes().is_err());
        e.coarse_align().unwrap();
        assert_eq!(e.state(), MorphState::CoarseAligned);
        assert!(e.coarse_align().is_err());
        e.improve_until(4, 0.05).unwrap();
        assert_eq!(e.state(), MorphState::Refining);
        e.refine_meshes().unwrap();
    }

    #[test]
    fn test_refine_doubles_grid() {
        let a = word_image(40, 20, &[5]);
        let b = word_image(40, 20, &[7]);
        let p = MorphParams::default();
        let mut e = MorphEngine::new(&a, &b, &p).unwrap();
        e.coarse_align().unwrap();
        let (r0, c0) = e.grid_dims();
        e.refine_meshes().unwrap();
        assert_eq!(e.grid_dims(), (2 * r0 - 1, 2 * c0 - 1));
    }

    #[test]
    fn test_dp_cost_recorded() {
        let a = word_image(40, 20, &[5]);
        let p = MorphParams::default();
        let mut e = MorphEngine::new(&a, &a, &p).unwrap();
        assert!(e.dp_cost().is_none());
        e.coarse_align().unwrap();
        assert_eq!(e.dp_cost(), Some(0.0));
    }
}
