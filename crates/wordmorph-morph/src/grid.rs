//! Control-point grids
//!
//! A morph is described by two parallel grids of control points laid over the
//! two images. `grid0` is axis-aligned over image 0 with a fixed spacing and
//! never moves; `grid1` starts as a copy and is deformed over image 1. The
//! grids always have identical logical dimensions, so corresponding cells
//! index 1:1 and each quad of `grid0` maps to the (possibly warped) quad of
//! `grid1` with the same index.
//!
//! Coordinates are stored as flat row-major `f64` arrays indexed
//! `row * cols + col`; nothing in the mesh is pointer-linked.

/// A `rows x cols` grid of (x, y) control points.
#[derive(Debug, Clone)]
pub struct ControlPointGrid {
    rows: usize,
    cols: usize,
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl ControlPointGrid {
    /// Build an axis-aligned grid covering `[0, width-1] x [0, height-1]`
    /// with the given spacing. The last row and column are pinned to the
    /// image edge, so the rightmost/bottom quads may be narrower than the
    /// spacing. At least 2 rows and 2 columns are always produced.
    pub fn axis_aligned(width: u32, height: u32, col_spacing: f64, row_spacing: f64) -> Self {
        let w = (width.max(1) - 1) as f64;
        let h = (height.max(1) - 1) as f64;
        let cols = grid_count(w, col_spacing);
        let rows = grid_count(h, row_spacing);
        let mut xs = Vec::with_capacity(rows * cols);
        let mut ys = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            let y = if r == rows - 1 {
                h
            } else {
                (r as f64 * row_spacing).min(h)
            };
            for c in 0..cols {
                let x = if c == cols - 1 {
                    w
                } else {
                    (c as f64 * col_spacing).min(w)
                };
                xs.push(x);
                ys.push(y);
            }
        }
        ControlPointGrid { rows, cols, xs, ys }
    }

    /// Number of point rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of point columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Flat index of point (r, c).
    #[inline]
    pub fn idx(&self, r: usize, c: usize) -> usize {
        debug_assert!(r < self.rows && c < self.cols);
        r * self.cols + c
    }

    /// X coordinate of point (r, c).
    #[inline]
    pub fn x(&self, r: usize, c: usize) -> f64 {
        self.xs[self.idx(r, c)]
    }

    /// Y coordinate of point (r, c).
    #[inline]
    pub fn y(&self, r: usize, c: usize) -> f64 {
        self.ys[self.idx(r, c)]
    }

    /// Set the coordinates of point (r, c).
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, x: f64, y: f64) {
        let i = self.idx(r, c);
        self.xs[i] = x;
        self.ys[i] = y;
    }

    /// Find the quad column containing `x` by scanning the (sorted) x
    /// coordinates of the top point row; returns the quad index and the
    /// fractional position inside it, both clamped to valid range.
    pub fn locate_col(&self, x: f64) -> (usize, f64) {
        locate(&self.xs[..self.cols], x)
    }

    /// Find the quad row containing `y`; returns the quad index and the
    /// fractional position inside it, both clamped to valid range.
    pub fn locate_row(&self, y: f64) -> (usize, f64) {
        let col0: Vec<f64> = (0..self.rows).map(|r| self.y(r, 0)).collect();
        locate(&col0, y)
    }

    /// Bilinearly interpolate the warped position of a point that sits at
    /// fraction `(s, t)` inside quad `(qr, qc)` of the partner grid.
    ///
    /// Quad corners are taken clockwise from the upper-left:
    /// `(qr,qc) (qr,qc+1) (qr+1,qc+1) (qr+1,qc)`.
    #[inline]
    pub fn warp_in_quad(&self, qr: usize, qc: usize, s: f64, t: f64) -> (f64, f64) {
        let i = self.idx(qr, qc);
        let one_s = 1.0 - s;
        let one_t = 1.0 - t;
        let x_top = one_s * self.xs[i] + s * self.xs[i + 1];
        let y_top = one_s * self.ys[i] + s * self.ys[i + 1];
        let x_bot = one_s * self.xs[i + self.cols] + s * self.xs[i + self.cols + 1];
        let y_bot = one_s * self.ys[i + self.cols] + s * self.ys[i + self.cols + 1];
        (one_t * x_top + t * x_bot, one_t * y_top + t * y_bot)
    }

    /// Subdivide every quad into 4 by inserting edge midpoints and quad
    /// centers (bilinear midpoints). Dimensions go from `rows x cols` to
    /// `2*rows-1 x 2*cols-1`. New points are interpolated, not optimized.
    pub fn subdivide(&mut self) {
        let new_rows = 2 * self.rows - 1;
        let new_cols = 2 * self.cols - 1;
        let mut xs = vec![0.0f64; new_rows * new_cols];
        let mut ys = vec![0.0f64; new_rows * new_cols];
        for nr in 0..new_rows {
            for nc in 0..new_cols {
                let (qr, qc) = (nr / 2, nc / 2);
                let s = if nc % 2 == 0 { 0.0 } else { 0.5 };
                let t = if nr % 2 == 0 { 0.0 } else { 0.5 };
                let (x, y) = if s == 0.0 && t == 0.0 {
                    (self.x(qr, qc), self.y(qr, qc))
                } else {
                    self.warp_in_quad(qr.min(self.rows - 2), qc.min(self.cols - 2), s, t)
                };
                xs[nr * new_cols + nc] = x;
                ys[nr * new_cols + nc] = y;
            }
        }
        self.rows = new_rows;
        self.cols = new_cols;
        self.xs = xs;
        self.ys = ys;
    }
}

/// Number of grid lines needed to cover `[0, extent]` at `spacing`, with the
/// last line pinned to the end of the range.
fn grid_count(extent: f64, spacing: f64) -> usize {
    let spacing = spacing.max(1.0);
    ((extent / spacing).ceil() as usize + 1).max(2)
}

/// Binary-search `coords` (nondecreasing) for the interval containing `v`;
/// returns the interval index and clamped fraction within it.
fn locate(coords: &[f64], v: f64) -> (usize, f64) {
    debug_assert!(coords.len() >= 2);
    let last = coords.len() - 2;
    let q = coords.partition_point(|&c| c <= v).saturating_sub(1).min(last);
    let span = coords[q + 1] - coords[q];
    let frac = if span > 0.0 {
        ((v - coords[q]) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (q, frac)
}
