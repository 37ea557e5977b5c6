//! World generation inputs.

use serde::{Deserialize, Serialize};

use crate::biome::BiomeCatalog;
use crate::curve::HeightCurve;
use crate::error::TerrainError;
use crate::navigability::PassageParams;
use crate::noise_field::NoiseConfig;

/// Everything one generation pass needs. Immutable once a pass starts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Grid cells along x.
    pub width: usize,
    /// Grid cells along y.
    pub length: usize,
    /// Primary terrain field.
    pub terrain: NoiseConfig,
    /// Optional detail field blended into the terrain.
    pub detail: Option<NoiseConfig>,
    /// Climate field for temperature and moisture.
    pub biome_noise: NoiseConfig,
    /// Biomes, in priority order; the first entry is the fallback.
    pub catalog: BiomeCatalog,
    /// Normalized height at or below which a cell is navigable.
    pub navigable_threshold: f64,
    /// Minimum passage width in cells. Zero disables widening.
    pub min_passage_width: usize,
    /// World elevation of a normalized height of 1.
    pub height_scale: f64,
    /// Taper terrain toward the world edges.
    pub use_falloff: bool,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            width: 256,
            length: 256,
            terrain: NoiseConfig {
                scale: 80.0,
                octaves: 5,
                height_curve: HeightCurve::from_points(&[
                    (0.0, 0.0),
                    (0.35, 0.15),
                    (0.6, 0.45),
                    (1.0, 1.0),
                ]),
                ..Default::default()
            },
            detail: Some(NoiseConfig {
                scale: 18.0,
                octaves: 3,
                seed: 1,
                ..Default::default()
            }),
            biome_noise: NoiseConfig::climate(2),
            catalog: BiomeCatalog::default_ocean_catalog(),
            navigable_threshold: 0.35,
            min_passage_width: 3,
            height_scale: 120.0,
            use_falloff: true,
        }
    }
}

impl WorldSettings {
    /// Set the seed of every noise field, offsetting detail and climate.
    pub fn reseed(&mut self, seed: u64) {
        self.terrain.seed = seed;
        if let Some(detail) = &mut self.detail {
            detail.seed = seed.wrapping_add(1);
        }
        self.biome_noise.seed = seed.wrapping_add(2);
    }

    /// Widening parameters derived from these settings.
    pub fn passage_params(&self) -> PassageParams {
        PassageParams {
            min_width: self.min_passage_width,
            threshold: self.navigable_threshold,
            height_scale: self.height_scale,
        }
    }

    /// Reject settings that would fail or degenerate mid-pass.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.width == 0 || self.length == 0 {
            return Err(TerrainError::InvalidDimensions {
                width: self.width,
                length: self.length,
            });
        }
        self.terrain.validate()?;
        if let Some(detail) = &self.detail {
            detail.validate()?;
        }
        self.biome_noise.validate()?;

        if !(0.0..=1.0).contains(&self.navigable_threshold) {
            return Err(TerrainError::ThresholdOutOfRange(self.navigable_threshold));
        }
        if !self.height_scale.is_finite() || self.height_scale <= 0.0 {
            return Err(TerrainError::InvalidHeightScale(self.height_scale));
        }
        if self.catalog.is_empty() {
            return Err(TerrainError::EmptyCatalog);
        }
        self.passage_params().validate(self.width, self.length)
    }
}
