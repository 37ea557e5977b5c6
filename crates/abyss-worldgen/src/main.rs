//! Seabed world generator.
//!
//! Loads `worldgen.ron`, applies command-line overrides, runs one generation
//! pass and writes PNG previews of the height, biome and navigability maps.
//!
//! Run with: `cargo run -p abyss-worldgen -- --seed 7 --width 512`

mod preview;

use std::path::PathBuf;
use std::process::ExitCode;

use abyss_config::{CliArgs, Config, ConfigError, default_config_dir};
use abyss_terrain::{GenerationStats, Step, TerrainError, WorldGenerator, WorldMaps};
use clap::Parser;
use tracing::{debug, error, info};

/// Anything that stops a run.
#[derive(Debug, thiserror::Error)]
pub enum WorldgenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to encode {}: {}", .0.display(), .1)]
    Png(PathBuf, #[source] png::EncodingError),
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = args.config.clone().unwrap_or_else(default_config_dir);

    let loaded = Config::load_or_create(&config_dir);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();
    config.apply_cli_overrides(&args);

    if let Err(e) = abyss_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    ) {
        eprintln!("logging unavailable: {e}");
    }

    if let Err(e) = loaded {
        error!(dir = %config_dir.display(), "{e}");
        return ExitCode::FAILURE;
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<(), WorldgenError> {
    config.validate()?;
    let settings = &config.generation;
    info!(
        width = settings.width,
        length = settings.length,
        seed = settings.terrain.seed,
        threshold = settings.navigable_threshold,
        min_passage_width = settings.min_passage_width,
        "generating world"
    );

    let generator = WorldGenerator::new(settings.clone())?;
    let (maps, stats) = if config.output.parallel {
        let threads = config.output.resolved_threads();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("worldgen-{i}"))
            .build()?;
        debug!(threads, "parallel pass");
        pool.install(|| generator.generate_parallel())?
    } else {
        generate_incremental(&generator, config.output.chunk_cells)?
    };

    log_stats(&maps, &stats, config);

    if config.output.write_previews {
        let written = preview::write_previews(&config.output.directory, &maps, &settings.catalog)?;
        info!(
            count = written.len(),
            dir = %config.output.directory.display(),
            "previews written"
        );
    }
    Ok(())
}

/// Drive a cursor to completion, logging progress in tenths per phase.
fn generate_incremental(
    generator: &WorldGenerator,
    chunk_cells: usize,
) -> Result<(WorldMaps, GenerationStats), TerrainError> {
    let mut cursor = generator.cursor(chunk_cells);
    let mut last = None;
    while let Step::Yielded { phase, progress } = cursor.step()? {
        let tenth = (progress * 10.0).floor() as u32;
        if last != Some((phase, tenth)) {
            last = Some((phase, tenth));
            let overall = (cursor.overall_progress() * 100.0).round() as u32;
            debug!(%phase, percent = tenth * 10, overall_percent = overall, "progress");
        }
    }
    cursor.finish()
}

fn log_stats(maps: &WorldMaps, stats: &GenerationStats, config: &Config) {
    let cells = maps.width() * maps.length();
    let pct = |n: usize| (n as f64 * 1000.0 / cells as f64).round() / 10.0;
    info!(
        navigable_before_pct = pct(stats.navigable_before_fixup),
        navigable_after_pct = pct(stats.navigable_after_fixup),
        passage_centers = stats.passage_centers,
        cells_opened = stats.cells_opened,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "navigability"
    );
    for (biome, &count) in config.generation.catalog.iter().zip(&stats.biome_counts) {
        debug!(biome = %biome.name, cells = count, share_pct = pct(count), "biome");
    }
}
