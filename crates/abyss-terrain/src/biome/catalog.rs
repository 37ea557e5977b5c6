//! Biome catalog: an ordered, validated list of [`BiomeDefinition`]s.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{BiomeColor, BiomeDefinition};
use crate::error::TerrainError;

/// Position of a biome in its [`BiomeCatalog`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeIndex(pub u16);

/// Immutable, non-empty list of biomes with unique names.
///
/// Order matters: the first entry is the fallback for heights no range covers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BiomeDefinition>", into = "Vec<BiomeDefinition>")]
pub struct BiomeCatalog {
    biomes: Vec<BiomeDefinition>,
    name_to_index: HashMap<String, BiomeIndex>,
}

impl BiomeCatalog {
    /// Validate and index `biomes`.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::EmptyCatalog`] for an empty list,
    /// [`TerrainError::DuplicateBiome`] if two entries share a name, and
    /// [`TerrainError::InvalidBiome`] for malformed ranges.
    pub fn new(biomes: Vec<BiomeDefinition>) -> Result<Self, TerrainError> {
        if biomes.is_empty() {
            return Err(TerrainError::EmptyCatalog);
        }
        if biomes.len() > u16::MAX as usize {
            return Err(TerrainError::InvalidBiome {
                name: biomes[u16::MAX as usize].name.clone(),
                reason: format!("catalog exceeds {} entries", u16::MAX),
            });
        }

        let mut name_to_index = HashMap::with_capacity(biomes.len());
        for (i, biome) in biomes.iter().enumerate() {
            biome.validate()?;
            if name_to_index
                .insert(biome.name.clone(), BiomeIndex(i as u16))
                .is_some()
            {
                return Err(TerrainError::DuplicateBiome(biome.name.clone()));
            }
        }
        Ok(Self {
            biomes,
            name_to_index,
        })
    }

    /// Returns the definition at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn get(&self, index: BiomeIndex) -> &BiomeDefinition {
        &self.biomes[index.0 as usize]
    }

    /// Returns the definition at `index`, or `None` when out of range.
    pub fn try_get(&self, index: BiomeIndex) -> Option<&BiomeDefinition> {
        self.biomes.get(index.0 as usize)
    }

    /// Looks up a biome index by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeIndex> {
        self.name_to_index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Always `false` for a constructed catalog.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiomeDefinition> {
        self.biomes.iter()
    }

    /// Seafloor biomes covering the full `[0, 1]` height range.
    pub fn default_ocean_catalog() -> Self {
        let biome = |name: &str,
                     color: BiomeColor,
                     (min_height, max_height): (f64, f64),
                     (temperature, moisture): (f64, f64),
                     navigable: bool,
                     roughness: f64,
                     decoration_density: f64| BiomeDefinition {
            name: name.to_string(),
            color,
            min_height,
            max_height,
            temperature,
            moisture,
            navigable,
            roughness,
            decoration_density,
            decoration_scale: 1.0,
        };

        let biomes = vec![
            biome("abyssal_plain", BiomeColor::new(12, 24, 64), (0.0, 0.25), (0.2, 0.5), true, 0.1, 0.02),
            biome("sand_flats", BiomeColor::new(194, 178, 128), (0.15, 0.45), (0.5, 0.2), true, 0.2, 0.05),
            biome("kelp_forest", BiomeColor::new(46, 110, 52), (0.2, 0.5), (0.6, 0.8), true, 0.3, 0.6),
            biome("coral_reef", BiomeColor::new(230, 110, 120), (0.2, 0.55), (0.85, 0.6), true, 0.5, 0.8),
            biome("rocky_shelf", BiomeColor::new(110, 104, 98), (0.45, 0.75), (0.4, 0.4), false, 0.7, 0.1),
            biome("volcanic_vents", BiomeColor::new(150, 40, 20), (0.5, 0.9), (0.95, 0.1), false, 0.9, 0.15),
            biome("ridge_peaks", BiomeColor::new(200, 200, 210), (0.75, 1.0), (0.3, 0.3), false, 1.0, 0.0),
        ];
        Self::new(biomes).expect("built-in ocean catalog is valid")
    }
}

impl Default for BiomeCatalog {
    fn default() -> Self {
        Self::default_ocean_catalog()
    }
}

impl TryFrom<Vec<BiomeDefinition>> for BiomeCatalog {
    type Error = TerrainError;

    fn try_from(biomes: Vec<BiomeDefinition>) -> Result<Self, Self::Error> {
        Self::new(biomes)
    }
}

impl From<BiomeCatalog> for Vec<BiomeDefinition> {
    fn from(catalog: BiomeCatalog) -> Self {
        catalog.biomes
    }
}
