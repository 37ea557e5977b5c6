//! Configuration sections with defaults and RON persistence.

use std::path::{Path, PathBuf};

use abyss_terrain::{DEFAULT_CHUNK_CELLS, WorldSettings};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE_NAME: &str = "worldgen.ron";

/// Top-level world generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Inputs of the generation pass.
    pub generation: WorldSettings,
    /// Where results go and how the pass is scheduled.
    pub output: OutputConfig,
    pub debug: DebugConfig,
}

/// Output and scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving preview images.
    pub directory: PathBuf,
    /// Write `height.png`, `biome.png` and `navigability.png`.
    pub write_previews: bool,
    /// Distribute rows over a thread pool instead of stepping incrementally.
    pub parallel: bool,
    /// Cells per incremental step.
    pub chunk_cells: usize,
    /// Worker threads for parallel passes. 0 means one per logical CPU.
    pub threads: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("worldgen-out"),
            write_previews: true,
            parallel: true,
            chunk_cells: DEFAULT_CHUNK_CELLS,
            threads: 0,
        }
    }
}

impl OutputConfig {
    /// Thread count with `0` resolved to the number of logical CPUs.
    pub fn resolved_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for the tools, e.g. `~/.config/abyss`.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("abyss")
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::load_file(&config_path)?;
            tracing::info!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            tracing::info!(path = %config_path.display(), "created default config");
            Ok(config)
        }
    }

    /// Parse a config file at an explicit path.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        ron::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Save config to the given directory as [`CONFIG_FILE_NAME`].
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(4)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read the file; `Some(new_config)` if it differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::load_file(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            tracing::info!("config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Reject configurations the generator or host cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output.chunk_cells == 0 {
            return Err(ConfigError::ZeroChunkCells);
        }
        self.generation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abyss_terrain::TerrainError;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(4))
                .unwrap();
        assert!(ron_str.contains("width: 256"), "missing world width:\n{ron_str}");
        assert!(ron_str.contains("chunk_cells: 1000"));
        assert!(ron_str.contains("abyssal_plain"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let ron_str = "(generation: (width: 64), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.generation.width, 64);
        assert_eq!(config.generation.length, WorldSettings::default().length);
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok(), "unknown fields should be ignored: {result:?}");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.generation.width = 96;
        config.generation.reseed(77);
        config.output.parallel = false;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.generation.navigable_threshold = 0.5;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(
            result.map(|c| c.generation.navigable_threshold),
            Some(0.5),
            "reload should surface the changed threshold"
        );
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Config::load_file(&dir.path().join("absent.ron")),
            Err(ConfigError::ReadError(_))
        ));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// world generation\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.output.chunk_cells = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroChunkCells)));

        let mut config = Config::default();
        config.generation.navigable_threshold = 2.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSettings(TerrainError::ThresholdOutOfRange(_)))
        ));
    }

    #[test]
    fn test_resolved_threads() {
        let mut output = OutputConfig::default();
        assert_eq!(output.resolved_threads(), num_cpus::get());
        output.threads = 3;
        assert_eq!(output.resolved_threads(), 3);
    }
}
