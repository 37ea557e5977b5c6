//! Output of a generation pass: parallel height, biome and navigability grids.

use crate::biome::{BiomeCatalog, BiomeIndex};
use crate::grid::Grid;

/// The committed result of one world generation pass.
///
/// All grids share the same `width` x `length` dimensions. World-coordinate
/// accessors clamp out-of-range coordinates to the nearest edge cell.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldMaps {
    /// Elevation of a normalized height of 1.
    pub height_scale: f64,
    /// Shaped noise before the height curve, in `[0, 1]`.
    pub noise: Grid<f32>,
    /// Elevation in `[0, height_scale]`.
    pub heights: Grid<f32>,
    /// Catalog index per cell.
    pub biomes: Grid<BiomeIndex>,
    /// Vehicle-traversable cells.
    pub navigable: Grid<bool>,
}

impl WorldMaps {
    pub(crate) fn empty(width: usize, length: usize, height_scale: f64) -> Self {
        Self {
            height_scale,
            noise: Grid::new(width, length),
            heights: Grid::new(width, length),
            biomes: Grid::new(width, length),
            navigable: Grid::new(width, length),
        }
    }

    pub fn width(&self) -> usize {
        self.heights.width()
    }

    pub fn length(&self) -> usize {
        self.heights.length()
    }

    /// Elevation at a world coordinate.
    pub fn height_at_world(&self, x: i64, y: i64) -> f32 {
        *self.heights.get_clamped(x, y)
    }

    /// Elevation divided by `height_scale`, in `[0, 1]`.
    pub fn normalized_height_at_world(&self, x: i64, y: i64) -> f64 {
        self.height_at_world(x, y) as f64 / self.height_scale
    }

    pub fn biome_at_world(&self, x: i64, y: i64) -> BiomeIndex {
        *self.biomes.get_clamped(x, y)
    }

    pub fn is_navigable_at_world(&self, x: i64, y: i64) -> bool {
        *self.navigable.get_clamped(x, y)
    }

    pub fn navigable_count(&self) -> usize {
        self.navigable.count(|&v| v)
    }

    /// Cells per catalog entry, indexed like the catalog.
    pub fn biome_counts(&self, catalog: &BiomeCatalog) -> Vec<usize> {
        let mut counts = vec![0; catalog.len()];
        for &BiomeIndex(i) in self.biomes.as_slice() {
            if let Some(c) = counts.get_mut(i as usize) {
                *c += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_accessors_clamp() {
        let mut maps = WorldMaps::empty(4, 3, 50.0);
        maps.heights.set(3, 2, 25.0);
        maps.heights.set(0, 0, 5.0);
        maps.navigable.set(0, 0, true);
        maps.biomes.set(3, 0, BiomeIndex(2));

        assert_eq!(maps.height_at_world(100, 100), 25.0);
        assert_eq!(maps.height_at_world(-1, -7), 5.0);
        assert!((maps.normalized_height_at_world(3, 2) - 0.5).abs() < 1e-9);
        assert!(maps.is_navigable_at_world(-3, 0));
        assert_eq!(maps.biome_at_world(9, -2), BiomeIndex(2));
        assert_eq!(maps.navigable_count(), 1);
        assert_eq!((maps.width(), maps.length()), (4, 3));
    }

    #[test]
    fn test_biome_counts() {
        let catalog = BiomeCatalog::default_ocean_catalog();
        let mut maps = WorldMaps::empty(2, 2, 1.0);
        maps.biomes.set(1, 1, BiomeIndex(3));
        let counts = maps.biome_counts(&catalog);
        assert_eq!(counts.len(), catalog.len());
        assert_eq!(counts[0], 3);
        assert_eq!(counts[3], 1);
    }
}
