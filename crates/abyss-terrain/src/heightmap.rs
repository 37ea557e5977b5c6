//! Height map construction.
//!
//! Each cell blends the terrain field with an optional detail field, subtracts
//! the edge falloff, reshapes the result through the terrain height curve and
//! scales it to world elevation.

use std::ops::Range;

use glam::DVec2;

use crate::curve::CurveLut;
use crate::error::TerrainError;
use crate::grid::Grid;
use crate::noise_field::{FalloffMap, NoiseConfig, NoiseField};

/// Weight of the detail field when blended into the terrain field.
pub const DETAIL_BLEND: f64 = 0.3;

/// Noise and elevation computed for one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellHeight {
    /// Shaped noise before the height curve, in `[0, 1]`.
    pub noise: f64,
    /// Elevation in world units, in `[0, height_scale]`.
    pub height: f64,
}

/// Builds elevation for a fixed world grid.
pub struct HeightMapBuilder {
    width: usize,
    length: usize,
    height_scale: f64,
    height_multiplier: f64,
    terrain: NoiseField,
    detail: Option<NoiseField>,
    falloff: Option<FalloffMap>,
    curve: CurveLut,
}

impl HeightMapBuilder {
    /// Prepare noise sources, falloff and curve for a `width` x `length` grid.
    pub fn new(
        width: usize,
        length: usize,
        terrain: &NoiseConfig,
        detail: Option<&NoiseConfig>,
        height_scale: f64,
        use_falloff: bool,
    ) -> Result<Self, TerrainError> {
        if width == 0 || length == 0 {
            return Err(TerrainError::InvalidDimensions { width, length });
        }
        if !height_scale.is_finite() || height_scale <= 0.0 {
            return Err(TerrainError::InvalidHeightScale(height_scale));
        }

        Ok(Self {
            width,
            length,
            height_scale,
            height_multiplier: terrain.height_multiplier,
            terrain: NoiseField::new(terrain)?,
            detail: detail.map(NoiseField::new).transpose()?,
            falloff: use_falloff.then(|| FalloffMap::new(width, length)),
            curve: terrain.height_curve.to_lut(),
        })
    }

    /// Compute noise and elevation at `(x, y)`.
    pub fn sample_cell(&self, x: usize, y: usize) -> CellHeight {
        let p = DVec2::new(x as f64, y as f64);
        let mut noise = self.terrain.sample(p);

        if let Some(detail) = &self.detail {
            let d = detail.sample(p);
            noise += (d - noise) * DETAIL_BLEND;
        }
        if let Some(falloff) = &self.falloff {
            noise = (noise - falloff.get(x, y)).clamp(0.0, 1.0);
        }

        let normalized = (self.curve.evaluate(noise) * self.height_multiplier).clamp(0.0, 1.0);
        CellHeight {
            noise,
            height: normalized * self.height_scale,
        }
    }

    /// Fill rows `rows` of both output buffers.
    ///
    /// `noise_out` and `height_out` cover exactly those rows, row-major.
    pub fn fill_rows(&self, rows: Range<usize>, noise_out: &mut [f32], height_out: &mut [f32]) {
        debug_assert_eq!(noise_out.len(), rows.len() * self.width);
        debug_assert_eq!(height_out.len(), rows.len() * self.width);

        let cells = rows.flat_map(|y| (0..self.width).map(move |x| (x, y)));
        for ((x, y), (n, h)) in cells.zip(noise_out.iter_mut().zip(height_out.iter_mut())) {
            let cell = self.sample_cell(x, y);
            *n = cell.noise as f32;
            *h = cell.height as f32;
        }
    }

    /// Build the full `(noise, heights)` grids.
    pub fn build(&self) -> (Grid<f32>, Grid<f32>) {
        let mut noise = Grid::new(self.width, self.length);
        let mut heights = Grid::new(self.width, self.length);
        self.fill_rows(0..self.length, noise.as_mut_slice(), heights.as_mut_slice());
        (noise, heights)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.length)
    }

    pub fn height_scale(&self) -> f64 {
        self.height_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::HeightCurve;

    fn terrain() -> NoiseConfig {
        NoiseConfig {
            seed: 9,
            scale: 20.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_heights_within_scale() {
        let builder = HeightMapBuilder::new(48, 32, &terrain(), None, 250.0, false).unwrap();
        let (noise, heights) = builder.build();
        assert_eq!(heights.dimensions(), (48, 32));
        for (x, y, &h) in heights.iter() {
            assert!((0.0..=250.0).contains(&h), "height {h} out of range at ({x}, {y})");
            assert!((0.0..=1.0).contains(noise.get(x, y)));
        }
    }

    #[test]
    fn test_linear_curve_height_is_noise_times_scale() {
        let builder = HeightMapBuilder::new(16, 16, &terrain(), None, 10.0, false).unwrap();
        for y in 0..16 {
            for x in 0..16 {
                let cell = builder.sample_cell(x, y);
                let expected = NoiseField::new(&terrain())
                    .unwrap()
                    .sample(DVec2::new(x as f64, y as f64));
                assert!((cell.noise - expected).abs() < 1e-12);
                assert!(
                    (cell.height - expected * 10.0).abs() < 1e-6,
                    "height {} should track noise {expected}",
                    cell.height
                );
            }
        }
    }

    #[test]
    fn test_detail_blend_is_thirty_percent() {
        let detail = NoiseConfig {
            seed: 1234,
            scale: 5.0,
            ..Default::default()
        };
        let builder =
            HeightMapBuilder::new(8, 8, &terrain(), Some(&detail), 1.0, false).unwrap();
        let base = NoiseField::new(&terrain()).unwrap();
        let fine = NoiseField::new(&detail).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                let p = DVec2::new(x as f64, y as f64);
                let expected = base.sample(p) * 0.7 + fine.sample(p) * 0.3;
                assert!((builder.sample_cell(x, y).noise - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_falloff_flattens_edges() {
        let with = HeightMapBuilder::new(64, 64, &terrain(), None, 1.0, true).unwrap();
        let without = HeightMapBuilder::new(64, 64, &terrain(), None, 1.0, false).unwrap();
        for i in 0..64 {
            assert_eq!(with.sample_cell(0, i).height, 0.0, "left edge should be flat");
            assert_eq!(with.sample_cell(i, 0).height, 0.0, "top edge should be flat");
            assert!(with.sample_cell(i, 32).height <= without.sample_cell(i, 32).height);
        }
    }

    #[test]
    fn test_height_curve_and_multiplier_apply() {
        let flat = NoiseConfig {
            height_curve: HeightCurve::from_points(&[(0.0, 0.4), (1.0, 0.4)]),
            height_multiplier: 0.5,
            ..terrain()
        };
        let builder = HeightMapBuilder::new(4, 4, &flat, None, 100.0, false).unwrap();
        let (_, heights) = builder.build();
        for (_, _, &h) in heights.iter() {
            assert!((h - 20.0).abs() < 1e-4, "expected 0.4 * 0.5 * 100, got {h}");
        }
    }

    #[test]
    fn test_row_fill_matches_full_build() {
        let builder = HeightMapBuilder::new(20, 10, &terrain(), None, 5.0, true).unwrap();
        let (full_noise, full_heights) = builder.build();

        let mut noise = vec![0.0; 3 * 20];
        let mut heights = vec![0.0; 3 * 20];
        builder.fill_rows(4..7, &mut noise, &mut heights);
        assert_eq!(&full_noise.as_slice()[80..140], noise.as_slice());
        assert_eq!(&full_heights.as_slice()[80..140], heights.as_slice());
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert_eq!(
            HeightMapBuilder::new(0, 5, &terrain(), None, 1.0, false).err(),
            Some(TerrainError::InvalidDimensions {
                width: 0,
                length: 5
            })
        );
        assert_eq!(
            HeightMapBuilder::new(5, 5, &terrain(), None, 0.0, false).err(),
            Some(TerrainError::InvalidHeightScale(0.0))
        );
        let bad_detail = NoiseConfig {
            octaves: 0,
            ..terrain()
        };
        assert_eq!(
            HeightMapBuilder::new(5, 5, &terrain(), Some(&bad_detail), 1.0, false).err(),
            Some(TerrainError::ZeroOctaves)
        );
    }
}
