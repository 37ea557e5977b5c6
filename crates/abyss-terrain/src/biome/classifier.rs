//! Nearest-climate biome selection within height-range constraints.

use glam::DVec2;

use super::{BiomeCatalog, BiomeIndex};
use crate::error::TerrainError;
use crate::noise_field::{NoiseConfig, NoiseField};

/// Offset between the temperature and moisture sample positions.
///
/// Both climate fields come from the same noise source; sampling moisture far
/// away decorrelates it from temperature.
pub const MOISTURE_OFFSET: DVec2 = DVec2::splat(1000.0);

/// Result of classifying one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Selected biome.
    pub index: BiomeIndex,
    /// `true` when no height range matched and the first entry was used.
    pub fallback: bool,
}

/// Pick the biome whose height range contains `normalized_height` and whose
/// climate targets are nearest (L1) to `(temperature, moisture)`.
///
/// Ties keep the earlier catalog entry. When no height range matches, the
/// first catalog entry is returned with `fallback` set.
pub fn classify(
    normalized_height: f64,
    temperature: f64,
    moisture: f64,
    catalog: &BiomeCatalog,
) -> Classification {
    let mut best: Option<(usize, f64)> = None;
    for (i, biome) in catalog.iter().enumerate() {
        if !biome.contains_height(normalized_height) {
            continue;
        }
        let score = biome.climate_distance(temperature, moisture);
        if best.is_none_or(|(_, best_score)| score < best_score) {
            best = Some((i, score));
        }
    }

    match best {
        Some((i, _)) => Classification {
            index: BiomeIndex(i as u16),
            fallback: false,
        },
        None => Classification {
            index: BiomeIndex(0),
            fallback: true,
        },
    }
}

/// [`classify`] without the fallback flag.
pub fn classify_index(
    normalized_height: f64,
    temperature: f64,
    moisture: f64,
    catalog: &BiomeCatalog,
) -> BiomeIndex {
    classify(normalized_height, temperature, moisture, catalog).index
}

/// Samples climate noise per cell and classifies against a catalog.
pub struct BiomeClassifier {
    climate: NoiseField,
    catalog: BiomeCatalog,
}

impl BiomeClassifier {
    /// Build the climate field from `climate` noise settings.
    pub fn new(climate: &NoiseConfig, catalog: BiomeCatalog) -> Result<Self, TerrainError> {
        Ok(Self {
            climate: NoiseField::new(climate)?,
            catalog,
        })
    }

    /// `(temperature, moisture)` at cell `(x, y)`, both in `[0, 1]`.
    pub fn climate_at(&self, x: usize, y: usize) -> (f64, f64) {
        let p = DVec2::new(x as f64, y as f64);
        (
            self.climate.sample_biome(p),
            self.climate.sample_biome(p + MOISTURE_OFFSET),
        )
    }

    /// Classify cell `(x, y)` at the given normalized height.
    pub fn classify_cell(&self, x: usize, y: usize, normalized_height: f64) -> Classification {
        let (temperature, moisture) = self.climate_at(x, y);
        let result = classify(normalized_height, temperature, moisture, &self.catalog);
        if result.fallback {
            tracing::trace!(x, y, normalized_height, "no biome height range matched, using index 0");
        }
        result
    }

    pub fn catalog(&self) -> &BiomeCatalog {
        &self.catalog
    }
}
