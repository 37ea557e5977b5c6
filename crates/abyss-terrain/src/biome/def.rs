//! Biome definition: the static properties of one catalog entry.

use serde::{Deserialize, Serialize};

use crate::error::TerrainError;

/// Display color for previews and map overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BiomeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BiomeColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Full descriptor for a biome type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDefinition {
    /// Unique name (e.g., "kelp_forest").
    pub name: String,
    /// Preview color.
    pub color: BiomeColor,
    /// Lowest normalized height (inclusive) this biome may occupy.
    pub min_height: f64,
    /// Highest normalized height (inclusive) this biome may occupy.
    pub max_height: f64,
    /// Preferred temperature in `[0, 1]`.
    pub temperature: f64,
    /// Preferred moisture in `[0, 1]`.
    pub moisture: f64,
    /// Whether a vehicle may traverse this biome's terrain.
    pub navigable: bool,
    /// Surface roughness factor consumed by mesh generation.
    pub roughness: f64,
    /// Decoration placements per cell, in `[0, 1]`.
    pub decoration_density: f64,
    /// Uniform scale applied to placed decorations.
    pub decoration_scale: f64,
}

impl BiomeDefinition {
    /// Returns `true` if `height` lies in `[min_height, max_height]`.
    pub fn contains_height(&self, height: f64) -> bool {
        height >= self.min_height && height <= self.max_height
    }

    /// L1 distance between this biome's climate targets and a sample.
    pub fn climate_distance(&self, temperature: f64, moisture: f64) -> f64 {
        (temperature - self.temperature).abs() + (moisture - self.moisture).abs()
    }

    pub(crate) fn validate(&self) -> Result<(), TerrainError> {
        let invalid = |reason: String| TerrainError::InvalidBiome {
            name: self.name.clone(),
            reason,
        };

        for (field, value) in [
            ("min_height", self.min_height),
            ("max_height", self.max_height),
            ("temperature", self.temperature),
            ("moisture", self.moisture),
            ("decoration_density", self.decoration_density),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(format!("{field} must lie in [0, 1], got {value}")));
            }
        }
        if self.min_height > self.max_height {
            return Err(invalid(format!(
                "height range [{}, {}] is inverted",
                self.min_height, self.max_height
            )));
        }
        for (field, value) in [
            ("roughness", self.roughness),
            ("decoration_scale", self.decoration_scale),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!(
                    "{field} must be a non-negative finite number, got {value}"
                )));
            }
        }
        Ok(())
    }
}
