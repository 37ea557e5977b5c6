//! Biome catalog and classification.
//!
//! Cells are assigned the catalog entry whose height range contains the
//! cell's normalized height and whose climate targets lie nearest (L1) to the
//! cell's sampled temperature and moisture.

mod catalog;
mod classifier;
mod def;

pub use catalog::{BiomeCatalog, BiomeIndex};
pub use classifier::{BiomeClassifier, Classification, MOISTURE_OFFSET, classify, classify_index};
pub use def::{BiomeColor, BiomeDefinition};
