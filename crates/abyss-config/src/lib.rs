//! World generation configuration.
//!
//! Settings persist to disk as `worldgen.ron`. Missing fields fall back to
//! defaults, unknown fields are ignored, and command-line flags override
//! whatever was loaded.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE_NAME, Config, DebugConfig, OutputConfig, default_config_dir};
pub use error::ConfigError;
