//! Command-line argument parsing for the world generator.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Seabed world generator.
///
/// CLI values override settings loaded from `worldgen.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "abyss-worldgen", about = "Generate seabed terrain, biomes and navigability")]
pub struct CliArgs {
    /// World width in cells.
    #[arg(long)]
    pub width: Option<usize>,

    /// World length in cells.
    #[arg(long)]
    pub length: Option<usize>,

    /// Seed for every noise field (detail and climate derive from it).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Normalized height at or below which cells are navigable.
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Minimum passage width in cells (0 disables widening).
    #[arg(long)]
    pub min_passage_width: Option<usize>,

    /// Disable the edge falloff.
    #[arg(long)]
    pub no_falloff: bool,

    /// Step the pass incrementally on one thread.
    #[arg(long)]
    pub sequential: bool,

    /// Worker threads for parallel passes (0 = one per CPU).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Directory for preview images.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        let generation = &mut self.generation;
        if let Some(w) = args.width {
            generation.width = w;
        }
        if let Some(l) = args.length {
            generation.length = l;
        }
        if let Some(seed) = args.seed {
            generation.reseed(seed);
        }
        if let Some(t) = args.threshold {
            generation.navigable_threshold = t;
        }
        if let Some(w) = args.min_passage_width {
            generation.min_passage_width = w;
        }
        if args.no_falloff {
            generation.use_falloff = false;
        }
        if args.sequential {
            self.output.parallel = false;
        }
        if let Some(n) = args.threads {
            self.output.threads = n;
        }
        if let Some(ref dir) = args.output {
            self.output.directory = dir.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
