//! Procedural seabed generation: layered noise, height maps, biome classification
//! and vehicle navigability with guaranteed passage widths.

mod curve;
mod error;
mod grid;
mod heightmap;
mod navigability;
mod noise_field;
mod pipeline;
mod settings;
mod world;

pub mod biome;
pub mod debug_viz;

pub use curve::{CurveKey, CurveLut, HeightCurve, LUT_SIZE};
pub use error::TerrainError;
pub use grid::Grid;
pub use heightmap::{CellHeight, DETAIL_BLEND, HeightMapBuilder};
pub use navigability::{
    EXPANDED_HEIGHT_FACTOR, OPEN_FRACTION_LIMIT, PassageParams, PassageReport, PassageScan,
    apply_expansions, derive_navigability, derive_navigability_into,
    enforce_minimum_passage_width,
};
pub use noise_field::{
    FALLOFF_A, FALLOFF_B, FalloffMap, NoiseConfig, NoiseField, falloff, falloff_curve,
    sample_biome_noise, sample_noise, sample_ridged_noise,
};
pub use pipeline::{
    CancelToken, DEFAULT_CHUNK_CELLS, GenerationCursor, GenerationStats, Phase, Step,
    WorldGenerator,
};
pub use settings::WorldSettings;
pub use world::WorldMaps;
