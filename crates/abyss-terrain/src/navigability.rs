//! Navigability derivation and minimum passage width enforcement.
//!
//! A cell is navigable when its normalized elevation sits at or below the
//! threshold. Narrow navigable regions are then widened: any navigable
//! interior cell whose surrounding window is mostly blocked opens a disc of
//! radius `min_width` around itself and lowers the terrain inside it.
//!
//! Widening reads a frozen snapshot of the thresholded map, so cells opened
//! during the pass never act as centers themselves and the result does not
//! depend on visiting order.

use std::ops::Range;

use rayon::prelude::*;

use crate::error::TerrainError;
use crate::grid::Grid;

/// A center whose window is at most this fraction open gets widened.
pub const OPEN_FRACTION_LIMIT: f64 = 0.6;

/// Cells in an expansion disc are set to `threshold * height_scale * EXPANDED_HEIGHT_FACTOR`.
pub const EXPANDED_HEIGHT_FACTOR: f64 = 0.5;

/// Threshold the height map: navigable iff `height / height_scale <= threshold`.
pub fn derive_navigability(heights: &Grid<f32>, height_scale: f64, threshold: f64) -> Grid<bool> {
    let (width, length) = heights.dimensions();
    let mut navigable = Grid::new(width, length);
    derive_navigability_into(heights.as_slice(), navigable.as_mut_slice(), height_scale, threshold);
    navigable
}

/// Threshold a slice of heights into a matching slice of flags.
pub fn derive_navigability_into(
    heights: &[f32],
    out: &mut [bool],
    height_scale: f64,
    threshold: f64,
) {
    for (flag, &h) in out.iter_mut().zip(heights) {
        *flag = h as f64 / height_scale <= threshold;
    }
}

/// Parameters for [`enforce_minimum_passage_width`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassageParams {
    /// Window radius and expansion radius, in cells. Zero disables widening.
    pub min_width: usize,
    /// Normalized navigable threshold in `[0, 1]`.
    pub threshold: f64,
    /// World elevation of a normalized height of 1.
    pub height_scale: f64,
}

impl PassageParams {
    /// Check that the window fits inside a `width` x `length` grid.
    pub fn validate(&self, width: usize, length: usize) -> Result<(), TerrainError> {
        if self.min_width > 0 && self.min_width * 2 >= width.min(length) {
            return Err(TerrainError::PassageWidthTooLarge {
                min_width: self.min_width,
                width,
                length,
            });
        }
        Ok(())
    }

    /// Elevation assigned to opened cells.
    pub fn expanded_height(&self) -> f32 {
        (self.threshold * self.height_scale * EXPANDED_HEIGHT_FACTOR) as f32
    }

    fn interior(&self, extent: usize) -> Range<usize> {
        self.min_width..extent.saturating_sub(self.min_width)
    }
}

/// Outcome of a widening pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassageReport {
    /// Navigable cells whose window was too narrow.
    pub centers: usize,
    /// Cells that changed from blocked to navigable.
    pub cells_opened: usize,
}

/// Summed-area table over a boolean grid.
struct OpenCounts {
    stride: usize,
    sums: Vec<u32>,
}

impl OpenCounts {
    fn new(grid: &Grid<bool>) -> Self {
        let (width, length) = grid.dimensions();
        let stride = width + 1;
        let mut sums = vec![0u32; stride * (length + 1)];
        for y in 0..length {
            let mut row_sum = 0u32;
            for x in 0..width {
                row_sum += u32::from(*grid.get(x, y));
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }
        Self { stride, sums }
    }

    /// Open cells in the inclusive rectangle `[x0, x1] x [y0, y1]`.
    fn count(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> u32 {
        let s = |x: usize, y: usize| self.sums[y * self.stride + x];
        s(x1 + 1, y1 + 1) + s(x0, y0) - s(x0, y1 + 1) - s(x1 + 1, y0)
    }
}

/// Read-only state for locating narrow passage centers.
pub struct PassageScan {
    snapshot: Grid<bool>,
    counts: OpenCounts,
    params: PassageParams,
}

impl PassageScan {
    /// Freeze `snapshot` for scanning.
    pub fn new(snapshot: Grid<bool>, params: PassageParams) -> Self {
        let counts = OpenCounts::new(&snapshot);
        Self {
            snapshot,
            counts,
            params,
        }
    }

    /// Rows whose cells may be centers.
    pub fn interior_rows(&self) -> Range<usize> {
        self.params.interior(self.snapshot.length())
    }

    /// Whether `(x, y)` is a navigable interior cell with a too-narrow window.
    pub fn is_narrow(&self, x: usize, y: usize) -> bool {
        let r = self.params.min_width;
        if r == 0
            || !self.interior_rows().contains(&y)
            || !self.params.interior(self.snapshot.width()).contains(&x)
            || !*self.snapshot.get(x, y)
        {
            return false;
        }
        let side = (2 * r + 1) as f64;
        let open = self.counts.count(x - r, y - r, x + r, y + r) as f64;
        open / (side * side) <= OPEN_FRACTION_LIMIT
    }

    /// Narrow centers in row `y`, left to right.
    pub fn centers_in_row(&self, y: usize) -> Vec<(usize, usize)> {
        if !self.interior_rows().contains(&y) {
            return Vec::new();
        }
        self.params
            .interior(self.snapshot.width())
            .filter(|&x| self.is_narrow(x, y))
            .map(|x| (x, y))
            .collect()
    }

    /// Narrow centers in `rows` (clipped to the interior).
    pub fn centers_in_rows(&self, rows: Range<usize>) -> Vec<(usize, usize)> {
        rows.flat_map(|y| self.centers_in_row(y)).collect()
    }

    /// All narrow centers, scanning rows in parallel.
    pub fn par_centers(&self) -> Vec<(usize, usize)> {
        self.interior_rows()
            .into_par_iter()
            .flat_map_iter(|y| self.centers_in_row(y))
            .collect()
    }

    pub fn params(&self) -> &PassageParams {
        &self.params
    }

    pub fn snapshot(&self) -> &Grid<bool> {
        &self.snapshot
    }
}

/// Open every cell within Euclidean distance `min_width` of each center and
/// set its elevation to [`PassageParams::expanded_height`]. Returns the number
/// of cells that became navigable.
///
/// Every write is idempotent, so the order of `centers` does not matter.
pub fn apply_expansions(
    navigable: &mut Grid<bool>,
    heights: &mut Grid<f32>,
    centers: &[(usize, usize)],
    params: &PassageParams,
) -> usize {
    let r = params.min_width as isize;
    let r2 = r * r;
    let lowered = params.expanded_height();
    let (width, length) = navigable.dimensions();
    let mut opened = 0;

    for &(cx, cy) in centers {
        for dy in -r..=r {
            for dx in -r..=r {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let x = cx as isize + dx;
                let y = cy as isize + dy;
                if x < 0 || y < 0 || x as usize >= width || y as usize >= length {
                    continue;
                }
                let (x, y) = (x as usize, y as usize);

                let flag = navigable.get_mut(x, y);
                if !*flag {
                    *flag = true;
                    opened += 1;
                }
                heights.set(x, y, lowered);
            }
        }
    }
    opened
}

/// Widen narrow navigable passages in place.
///
/// Reads a snapshot of `navigable` taken on entry; writes the live map and
/// height grid. Navigability never decreases.
pub fn enforce_minimum_passage_width(
    navigable: &mut Grid<bool>,
    heights: &mut Grid<f32>,
    params: &PassageParams,
) -> Result<PassageReport, TerrainError> {
    let (width, length) = navigable.dimensions();
    params.validate(width, length)?;
    if params.min_width == 0 {
        return Ok(PassageReport::default());
    }

    let scan = PassageScan::new(navigable.clone(), *params);
    let centers = scan.par_centers();
    let cells_opened = apply_expansions(navigable, heights, &centers, params);
    tracing::debug!(
        centers = centers.len(),
        cells_opened,
        min_width = params.min_width,
        "passage width enforced"
    );
    Ok(PassageReport {
        centers: centers.len(),
        cells_opened,
    })
}
