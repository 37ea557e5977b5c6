//! Multi-octave Perlin noise fields and the world-edge falloff.
//!
//! Three sampling modes share one seeded Perlin source:
//! - [`NoiseField::sample`]: normalized fractal sum (fBm) in `[0, 1]`.
//! - [`NoiseField::sample_ridged`]: ridged multifractal, amplitude-accumulated
//!   and clamped rather than normalized.
//! - [`NoiseField::sample_biome`]: a single broad octave used for climate fields.

use glam::DVec2;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::curve::HeightCurve;
use crate::error::TerrainError;
use crate::grid::Grid;

/// Falloff curve exponent.
pub const FALLOFF_A: f64 = 3.0;
/// Falloff curve shift; larger values push the taper closer to the edge.
pub const FALLOFF_B: f64 = 2.2;

/// Half-width of the range per-octave sampling offsets are drawn from.
const OCTAVE_OFFSET_RANGE: f64 = 100_000.0;

/// Parameters for one noise field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Base sampling wavelength in cells. Must be positive.
    pub scale: f64,
    /// Number of octaves summed. Must be at least 1.
    pub octaves: u32,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Seed for the Perlin permutation and the per-octave offsets.
    pub seed: u64,
    /// World-space offset added to every sample position.
    pub offset: DVec2,
    /// Multiplier applied to the curve output before clamping to `[0, 1]`.
    pub height_multiplier: f64,
    /// Remaps normalized noise to a height weighting.
    pub height_curve: HeightCurve,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            scale: 50.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            seed: 0,
            offset: DVec2::ZERO,
            height_multiplier: 1.0,
            height_curve: HeightCurve::linear(),
        }
    }
}

impl NoiseConfig {
    /// Broad single-octave defaults for temperature/moisture sampling.
    pub fn climate(seed: u64) -> Self {
        Self {
            scale: 200.0,
            octaves: 1,
            seed,
            ..Default::default()
        }
    }

    /// Reject configurations that would produce degenerate output.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(TerrainError::InvalidScale(self.scale));
        }
        if self.octaves == 0 {
            return Err(TerrainError::ZeroOctaves);
        }
        for (name, value) in [
            ("persistence", self.persistence),
            ("lacunarity", self.lacunarity),
            ("offset.x", self.offset.x),
            ("offset.y", self.offset.y),
            ("height_multiplier", self.height_multiplier),
        ] {
            if !value.is_finite() {
                return Err(TerrainError::NonFiniteParameter { name, value });
            }
        }
        if self.persistence < 0.0 {
            return Err(TerrainError::NonFiniteParameter {
                name: "persistence",
                value: self.persistence,
            });
        }
        if self.lacunarity <= 0.0 {
            return Err(TerrainError::NonFiniteParameter {
                name: "lacunarity",
                value: self.lacunarity,
            });
        }
        self.height_curve.validate()
    }
}

/// A seeded, validated noise source built from a [`NoiseConfig`].
pub struct NoiseField {
    perlin: Perlin,
    octave_offsets: Vec<DVec2>,
    config: NoiseConfig,
}

impl NoiseField {
    /// Validate `config` and build the Perlin source and octave offsets.
    pub fn new(config: &NoiseConfig) -> Result<Self, TerrainError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let octave_offsets = (0..config.octaves)
            .map(|_| {
                DVec2::new(
                    rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE),
                    rng.random_range(-OCTAVE_OFFSET_RANGE..OCTAVE_OFFSET_RANGE),
                )
            })
            .collect();

        Ok(Self {
            perlin: Perlin::new(perlin_seed(config.seed)),
            octave_offsets,
            config: config.clone(),
        })
    }

    /// Fractal sum normalized by total amplitude, mapped to `[0, 1]`.
    pub fn sample(&self, position: DVec2) -> f64 {
        let base = (position + self.config.offset) / self.config.scale;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total = 0.0;
        let mut max_amplitude = 0.0;

        for offset in &self.octave_offsets {
            let p = base * frequency + *offset;
            total += self.layer(p) * amplitude;
            max_amplitude += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if max_amplitude <= 0.0 {
            return 0.5;
        }
        unit(((total / max_amplitude) + 1.0) * 0.5)
    }

    /// Ridged multifractal in `[0, 1]`.
    ///
    /// Each octave contributes `(1 - |n|)^2`, scaled by a weight derived from
    /// the previous octave, so bright ridges reinforce finer detail and dark
    /// valleys suppress it.
    pub fn sample_ridged(&self, position: DVec2) -> f64 {
        let base = (position + self.config.offset) / self.config.scale;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut weight = 1.0;
        let mut total = 0.0;

        for offset in &self.octave_offsets {
            let p = base * frequency + *offset;
            let mut value = 1.0 - self.layer(p).abs();
            value *= value;
            value *= weight;
            weight = (value * 2.0).clamp(0.0, 1.0);

            total += value * amplitude;
            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        unit(total)
    }

    /// Single octave at `(position + offset) / scale`, mapped to `[0, 1]`.
    pub fn sample_biome(&self, position: DVec2) -> f64 {
        let p = (position + self.config.offset) / self.config.scale;
        unit((self.layer(p) + 1.0) * 0.5)
    }

    fn layer(&self, p: DVec2) -> f64 {
        let n = self.perlin.get([p.x, p.y]);
        if n.is_finite() { n.clamp(-1.0, 1.0) } else { 0.0 }
    }
}

/// Fold a 64-bit seed into the 32-bit Perlin permutation seed.
///
/// Seeds below `2^32` map to themselves; higher bits are mixed in rather than
/// dropped.
fn perlin_seed(seed: u64) -> u32 {
    (seed ^ (seed >> 32)) as u32
}

/// One-off fBm sample; builds a [`NoiseField`] for the call.
pub fn sample_noise(position: DVec2, config: &NoiseConfig) -> Result<f64, TerrainError> {
    Ok(NoiseField::new(config)?.sample(position))
}

/// One-off ridged sample; builds a [`NoiseField`] for the call.
pub fn sample_ridged_noise(position: DVec2, config: &NoiseConfig) -> Result<f64, TerrainError> {
    Ok(NoiseField::new(config)?.sample_ridged(position))
}

/// One-off climate sample; builds a [`NoiseField`] for the call.
pub fn sample_biome_noise(position: DVec2, config: &NoiseConfig) -> Result<f64, TerrainError> {
    Ok(NoiseField::new(config)?.sample_biome(position))
}

/// Square falloff at cell `(x, y)` of a `width` x `length` grid.
///
/// Near 0 at the center, approaching 1 at the border.
pub fn falloff(x: usize, y: usize, width: usize, length: usize) -> f64 {
    let nx = x as f64 / width.max(1) as f64 * 2.0 - 1.0;
    let ny = y as f64 / length.max(1) as f64 * 2.0 - 1.0;
    falloff_curve(nx.abs().max(ny.abs()))
}

/// `v^a / (v^a + (b - b*v)^a)` for a Chebyshev distance `v` in `[0, 1]`.
pub fn falloff_curve(distance: f64) -> f64 {
    let v = if distance.is_finite() {
        distance.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let near = v.powf(FALLOFF_A);
    let far = (FALLOFF_B - FALLOFF_B * v).powf(FALLOFF_A);
    unit(near / (near + far))
}

/// Precomputed [`falloff`] values for a whole grid.
#[derive(Clone, Debug)]
pub struct FalloffMap {
    values: Grid<f64>,
}

impl FalloffMap {
    /// Compute the falloff for every cell.
    pub fn new(width: usize, length: usize) -> Self {
        let mut values = Grid::new(width, length);
        for (x, y, v) in values.iter_mut() {
            *v = falloff(x, y, width, length);
        }
        Self { values }
    }

    /// Falloff at `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        *self.values.get(x, y)
    }
}

/// Clamp to `[0, 1]`, mapping NaN/Infinity to the midpoint.
fn unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.5 }
}
