//! Phased world generation.
//!
//! A pass runs four phases in order: height, biome, navigability and passage
//! width. Each phase reads only arrays committed by earlier phases. Hosts can
//! run a pass in one call ([`WorldGenerator::generate`],
//! [`WorldGenerator::generate_parallel`]) or drive it a chunk at a time with a
//! [`GenerationCursor`], yielding to their own loop between chunks. Both paths
//! produce identical maps.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::biome::{BiomeClassifier, BiomeIndex};
use crate::error::TerrainError;
use crate::heightmap::HeightMapBuilder;
use crate::navigability::{PassageParams, PassageScan, apply_expansions, derive_navigability_into};
use crate::settings::WorldSettings;
use crate::world::WorldMaps;

/// Cells processed per [`GenerationCursor::step`] by default.
pub const DEFAULT_CHUNK_CELLS: usize = 1000;

/// Generation phase, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Height,
    Biome,
    Navigability,
    PassageWidth,
    Done,
}

impl Phase {
    fn next(self) -> Self {
        match self {
            Phase::Height => Phase::Biome,
            Phase::Biome => Phase::Navigability,
            Phase::Navigability => Phase::PassageWidth,
            Phase::PassageWidth | Phase::Done => Phase::Done,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Height => "height",
            Phase::Biome => "biome",
            Phase::Navigability => "navigability",
            Phase::PassageWidth => "passage width",
            Phase::Done => "done",
        })
    }
}

/// Shared flag for cancelling a pass from another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next chunk or phase boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Summary of a completed pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationStats {
    /// Navigable cells straight after thresholding.
    pub navigable_before_fixup: usize,
    /// Navigable cells after passage widening.
    pub navigable_after_fixup: usize,
    /// Cells that triggered widening.
    pub passage_centers: usize,
    /// Cells opened by widening.
    pub cells_opened: usize,
    /// Cells whose height matched no biome range.
    pub biome_fallbacks: usize,
    /// Cells per catalog entry.
    pub biome_counts: Vec<usize>,
    /// Wall time of the pass.
    pub elapsed: Duration,
}

/// Outcome of one [`GenerationCursor::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// A chunk was processed; `progress` is the fraction of `phase` complete.
    Yielded { phase: Phase, progress: f64 },
    /// All phases are complete.
    Finished,
}

/// Validated settings plus the noise sources built from them.
pub struct WorldGenerator {
    settings: WorldSettings,
    heights: HeightMapBuilder,
    classifier: BiomeClassifier,
    cancel: CancelToken,
}

impl WorldGenerator {
    /// Validate `settings` and prepare noise fields.
    pub fn new(settings: WorldSettings) -> Result<Self, TerrainError> {
        settings.validate()?;
        let heights = HeightMapBuilder::new(
            settings.width,
            settings.length,
            &settings.terrain,
            settings.detail.as_ref(),
            settings.height_scale,
            settings.use_falloff,
        )?;
        let classifier = BiomeClassifier::new(&settings.biome_noise, settings.catalog.clone())?;
        Ok(Self {
            settings,
            heights,
            classifier,
            cancel: CancelToken::new(),
        })
    }

    /// Use `token` to cancel passes started from this generator.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Start an incremental pass processing `chunk_cells` cells per step.
    pub fn cursor(&self, chunk_cells: usize) -> GenerationCursor<'_> {
        GenerationCursor::new(self, chunk_cells)
    }

    /// Run a full pass on the calling thread.
    pub fn generate(&self) -> Result<(WorldMaps, GenerationStats), TerrainError> {
        self.cursor(DEFAULT_CHUNK_CELLS).finish()
    }

    /// Run a full pass with rows distributed over the rayon thread pool.
    pub fn generate_parallel(&self) -> Result<(WorldMaps, GenerationStats), TerrainError> {
        let started = Instant::now();
        let s = &self.settings;
        let width = s.width;
        let mut maps = WorldMaps::empty(width, s.length, s.height_scale);
        let mut stats = GenerationStats::default();

        self.check_cancel(Phase::Height)?;
        debug!(width, length = s.length, "height phase");
        maps.noise
            .as_mut_slice()
            .par_chunks_mut(width)
            .zip(maps.heights.as_mut_slice().par_chunks_mut(width))
            .enumerate()
            .try_for_each(|(y, (noise, heights))| -> Result<(), TerrainError> {
                self.check_cancel(Phase::Height)?;
                self.heights.fill_rows(y..y + 1, noise, heights);
                Ok(())
            })?;

        self.check_cancel(Phase::Biome)?;
        debug!("biome phase");
        let height_scale = s.height_scale;
        stats.biome_fallbacks = maps
            .biomes
            .as_mut_slice()
            .par_chunks_mut(width)
            .zip(maps.heights.as_slice().par_chunks(width))
            .enumerate()
            .map(|(y, (biomes, heights))| -> Result<usize, TerrainError> {
                self.check_cancel(Phase::Biome)?;
                let mut fallbacks = 0;
                for (x, (biome, &h)) in biomes.iter_mut().zip(heights).enumerate() {
                    let result = self.classifier.classify_cell(x, y, h as f64 / height_scale);
                    fallbacks += usize::from(result.fallback);
                    *biome = result.index;
                }
                Ok(fallbacks)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))?;

        self.check_cancel(Phase::Navigability)?;
        debug!("navigability phase");
        let threshold = s.navigable_threshold;
        maps.navigable
            .as_mut_slice()
            .par_chunks_mut(width)
            .zip(maps.heights.as_slice().par_chunks(width))
            .for_each(|(flags, heights)| {
                derive_navigability_into(heights, flags, height_scale, threshold)
            });
        stats.navigable_before_fixup = maps.navigable_count();

        self.check_cancel(Phase::PassageWidth)?;
        debug!("passage width phase");
        let params = s.passage_params();
        if params.min_width > 0 {
            let scan = PassageScan::new(maps.navigable.clone(), params);
            let centers = scan.par_centers();
            stats.passage_centers = centers.len();
            stats.cells_opened =
                apply_expansions(&mut maps.navigable, &mut maps.heights, &centers, &params);
        }

        self.complete(&maps, &mut stats, started);
        Ok((maps, stats))
    }

    fn check_cancel(&self, phase: Phase) -> Result<(), TerrainError> {
        if self.cancel.is_cancelled() {
            return Err(TerrainError::Cancelled(phase));
        }
        Ok(())
    }

    fn complete(&self, maps: &WorldMaps, stats: &mut GenerationStats, started: Instant) {
        stats.navigable_after_fixup = maps.navigable_count();
        stats.biome_counts = maps.biome_counts(&self.settings.catalog);
        stats.elapsed = started.elapsed();

        if stats.biome_fallbacks > 0 {
            debug!(
                cells = stats.biome_fallbacks,
                "cells fell back to the first biome; catalog height ranges leave gaps"
            );
        }
        info!(
            width = self.settings.width,
            length = self.settings.length,
            navigable_before = stats.navigable_before_fixup,
            navigable_after = stats.navigable_after_fixup,
            passage_centers = stats.passage_centers,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "world generated"
        );
    }
}

/// Incremental pass over a [`WorldGenerator`].
///
/// Each [`step`](Self::step) processes at most `chunk_cells` cells of the
/// current phase, then returns so the caller can yield.
pub struct GenerationCursor<'a> {
    generator: &'a WorldGenerator,
    chunk_cells: usize,
    phase: Phase,
    next: usize,
    maps: WorldMaps,
    stats: GenerationStats,
    passage: Option<PassageScan>,
    started: Instant,
}

impl<'a> GenerationCursor<'a> {
    fn new(generator: &'a WorldGenerator, chunk_cells: usize) -> Self {
        let s = &generator.settings;
        Self {
            generator,
            chunk_cells: chunk_cells.max(1),
            phase: Phase::Height,
            next: 0,
            maps: WorldMaps::empty(s.width, s.length, s.height_scale),
            stats: GenerationStats::default(),
            passage: None,
            started: Instant::now(),
        }
    }

    /// Maps as committed so far. Arrays of unfinished phases are incomplete.
    pub fn maps(&self) -> &WorldMaps {
        &self.maps
    }

    /// The phase the next step will work on.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Fraction of the whole pass completed, in `[0, 1]`.
    pub fn overall_progress(&self) -> f64 {
        let phase_index = match self.phase {
            Phase::Height => 0.0,
            Phase::Biome => 1.0,
            Phase::Navigability => 2.0,
            Phase::PassageWidth => 3.0,
            Phase::Done => return 1.0,
        };
        (phase_index + self.next as f64 / self.total() as f64) / 4.0
    }

    /// Process one chunk.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::Cancelled`] if the generator's token was
    /// cancelled.
    pub fn step(&mut self) -> Result<Step, TerrainError> {
        if self.phase == Phase::Done {
            return Ok(Step::Finished);
        }
        if self.generator.cancel.is_cancelled() {
            warn!(phase = %self.phase, "generation cancelled");
            return Err(TerrainError::Cancelled(self.phase));
        }

        let total = self.total();
        let range = self.next..(self.next + self.chunk_cells).min(total);
        match self.phase {
            Phase::Height => self.step_height(range.clone()),
            Phase::Biome => self.step_biome(range.clone()),
            Phase::Navigability => self.step_navigability(range.clone()),
            Phase::PassageWidth => self.step_passage(range.clone()),
            Phase::Done => {}
        }
        self.next = range.end;

        let phase = self.phase;
        let progress = self.next as f64 / total as f64;
        if self.next >= total {
            self.advance();
            if self.phase == Phase::Done {
                return Ok(Step::Finished);
            }
        }
        Ok(Step::Yielded { phase, progress })
    }

    /// Run remaining steps and return the committed maps.
    pub fn finish(mut self) -> Result<(WorldMaps, GenerationStats), TerrainError> {
        while let Step::Yielded { .. } = self.step()? {}
        Ok((self.maps, self.stats))
    }

    fn total(&self) -> usize {
        self.maps.heights.len()
    }

    fn cell(&self, index: usize) -> (usize, usize) {
        let width = self.maps.width();
        (index % width, index / width)
    }

    fn step_height(&mut self, range: Range<usize>) {
        for i in range {
            let (x, y) = self.cell(i);
            let cell = self.generator.heights.sample_cell(x, y);
            self.maps.noise.as_mut_slice()[i] = cell.noise as f32;
            self.maps.heights.as_mut_slice()[i] = cell.height as f32;
        }
    }

    fn step_biome(&mut self, range: Range<usize>) {
        let height_scale = self.maps.height_scale;
        for i in range {
            let (x, y) = self.cell(i);
            let h = self.maps.heights.as_slice()[i] as f64 / height_scale;
            let result = self.generator.classifier.classify_cell(x, y, h);
            self.stats.biome_fallbacks += usize::from(result.fallback);
            self.maps.biomes.as_mut_slice()[i] = result.index;
        }
    }

    fn step_navigability(&mut self, range: Range<usize>) {
        let s = &self.generator.settings;
        derive_navigability_into(
            &self.maps.heights.as_slice()[range.clone()],
            &mut self.maps.navigable.as_mut_slice()[range],
            s.height_scale,
            s.navigable_threshold,
        );
    }

    fn step_passage(&mut self, range: Range<usize>) {
        let Some(scan) = &self.passage else {
            return;
        };
        let centers: Vec<(usize, usize)> = range
            .map(|i| self.cell(i))
            .filter(|&(x, y)| scan.is_narrow(x, y))
            .collect();

        let params: PassageParams = *scan.params();
        self.stats.passage_centers += centers.len();
        self.stats.cells_opened += apply_expansions(
            &mut self.maps.navigable,
            &mut self.maps.heights,
            &centers,
            &params,
        );
    }

    fn advance(&mut self) {
        let finished = self.phase;
        self.phase = finished.next();
        self.next = 0;
        debug!(phase = %finished, "phase complete");

        match self.phase {
            Phase::PassageWidth => {
                self.stats.navigable_before_fixup = self.maps.navigable_count();
                let params = self.generator.settings.passage_params();
                if params.min_width > 0 {
                    self.passage = Some(PassageScan::new(self.maps.navigable.clone(), params));
                }
            }
            Phase::Done => {
                self.passage = None;
                self.generator
                    .complete(&self.maps, &mut self.stats, self.started);
            }
            _ => {}
        }
    }
}

impl GenerationStats {
    /// Cells assigned `index`.
    pub fn biome_count(&self, index: BiomeIndex) -> usize {
        self.biome_counts.get(index.0 as usize).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::{BiomeCatalog, BiomeColor, BiomeDefinition};
    use crate::noise_field::NoiseConfig;

    fn settings(width: usize, length: usize) -> WorldSettings {
        let mut settings = WorldSettings {
            width,
            length,
            min_passage_width: 2,
            navigable_threshold: 0.4,
            ..Default::default()
        };
        settings.reseed(31);
        settings.terrain.scale = 12.0;
        settings
    }

    fn assert_same_stats(a: &GenerationStats, b: &GenerationStats) {
        assert_eq!(a.navigable_before_fixup, b.navigable_before_fixup);
        assert_eq!(a.navigable_after_fixup, b.navigable_after_fixup);
        assert_eq!(a.passage_centers, b.passage_centers);
        assert_eq!(a.cells_opened, b.cells_opened);
        assert_eq!(a.biome_fallbacks, b.biome_fallbacks);
        assert_eq!(a.biome_counts, b.biome_counts);
    }

    #[test]
    fn test_small_world_single_biome_end_to_end() {
        let catalog = BiomeCatalog::new(vec![BiomeDefinition {
            name: "seabed".into(),
            color: BiomeColor::new(0, 0, 255),
            min_height: 0.0,
            max_height: 1.0,
            temperature: 0.5,
            moisture: 0.5,
            navigable: true,
            roughness: 0.0,
            decoration_density: 0.0,
            decoration_scale: 1.0,
        }])
        .unwrap();
        let settings = WorldSettings {
            width: 4,
            length: 4,
            catalog,
            navigable_threshold: 0.3,
            min_passage_width: 1,
            height_scale: 10.0,
            use_falloff: false,
            terrain: NoiseConfig {
                scale: 3.0,
                ..Default::default()
            },
            detail: None,
            ..Default::default()
        };
        let generator = WorldGenerator::new(settings).unwrap();

        let mut cursor = generator.cursor(3);
        while cursor.phase() != Phase::PassageWidth {
            assert!(matches!(cursor.step().unwrap(), Step::Yielded { .. }));
        }
        let pre_fixup = cursor.maps().clone();
        for (x, y, &open) in pre_fixup.navigable.iter() {
            let normalized = *pre_fixup.heights.get(x, y) as f64 / 10.0;
            assert_eq!(open, normalized <= 0.3, "navigability mismatch at ({x}, {y})");
        }

        let (maps, stats) = cursor.finish().unwrap();
        assert!(maps.biomes.as_slice().iter().all(|&b| b == BiomeIndex(0)));
        assert_eq!(stats.biome_fallbacks, 0);
        assert_eq!(stats.biome_counts, vec![16]);
        assert_eq!(stats.navigable_before_fixup, pre_fixup.navigable_count());
        for (x, y, &open) in pre_fixup.navigable.iter() {
            if open {
                assert!(*maps.navigable.get(x, y));
            }
        }
    }

    #[test]
    fn test_chunked_parallel_and_full_passes_agree() {
        let generator = WorldGenerator::new(settings(40, 30)).unwrap();
        let (full, full_stats) = generator.generate().unwrap();
        let (chunked, chunked_stats) = generator.cursor(7).finish().unwrap();
        let (parallel, parallel_stats) = generator.generate_parallel().unwrap();

        assert_eq!(full, chunked);
        assert_eq!(full, parallel);
        assert_same_stats(&full_stats, &chunked_stats);
        assert_same_stats(&full_stats, &parallel_stats);
    }

    #[test]
    fn test_output_invariants() {
        let generator = WorldGenerator::new(settings(48, 48)).unwrap();
        let (maps, stats) = generator.generate_parallel().unwrap();
        let catalog = &generator.settings().catalog;

        assert_eq!(maps.heights.dimensions(), maps.biomes.dimensions());
        assert_eq!(maps.heights.dimensions(), maps.navigable.dimensions());
        for (x, y, &h) in maps.heights.iter() {
            assert!((0.0..=120.0).contains(&h), "height {h} out of range at ({x}, {y})");
            assert!((0.0..=1.0).contains(maps.noise.get(x, y)));
            assert!((maps.biomes.get(x, y).0 as usize) < catalog.len());
        }
        assert!(stats.navigable_after_fixup >= stats.navigable_before_fixup);
        assert_eq!(
            stats.navigable_after_fixup - stats.navigable_before_fixup,
            stats.cells_opened
        );
        assert_eq!(stats.biome_counts.iter().sum::<usize>(), 48 * 48);
    }

    #[test]
    fn test_cursor_reports_progress_and_finishes() {
        let generator = WorldGenerator::new(settings(20, 20)).unwrap();
        let mut cursor = generator.cursor(150);
        let mut last_phase = Phase::Height;
        let mut steps = 0;
        loop {
            match cursor.step().unwrap() {
                Step::Yielded { phase, progress } => {
                    assert!(phase >= last_phase, "phases must not go backwards");
                    assert!(progress > 0.0 && progress <= 1.0);
                    last_phase = phase;
                    steps += 1;
                }
                Step::Finished => break,
            }
        }
        // 400 cells per phase in chunks of 150: 3 steps each, the last one finishing.
        assert_eq!(steps, 11);
        assert_eq!(cursor.phase(), Phase::Done);
        assert_eq!(cursor.overall_progress(), 1.0);
        assert_eq!(cursor.step().unwrap(), Step::Finished);
    }

    #[test]
    fn test_cancellation_between_chunks() {
        let token = CancelToken::new();
        let generator = WorldGenerator::new(settings(32, 32))
            .unwrap()
            .with_cancel_token(token.clone());

        let mut cursor = generator.cursor(DEFAULT_CHUNK_CELLS);
        cursor.step().unwrap();
        cursor.step().unwrap();
        token.cancel();
        assert_eq!(cursor.step(), Err(TerrainError::Cancelled(Phase::Biome)));

        assert_eq!(
            generator.generate_parallel().err(),
            Some(TerrainError::Cancelled(Phase::Height))
        );
        assert!(generator.cancel_token().is_cancelled());
    }

    #[test]
    fn test_invalid_settings_fail_fast() {
        let mut bad = settings(16, 16);
        bad.terrain.octaves = 0;
        assert_eq!(WorldGenerator::new(bad).err(), Some(TerrainError::ZeroOctaves));

        let too_wide = WorldSettings {
            min_passage_width: 8,
            ..settings(16, 16)
        };
        assert!(matches!(
            WorldGenerator::new(too_wide).err(),
            Some(TerrainError::PassageWidthTooLarge { .. })
        ));
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::PassageWidth.to_string(), "passage width");
        assert_eq!(
            TerrainError::Cancelled(Phase::Biome).to_string(),
            "generation cancelled during biome phase"
        );
    }
}
