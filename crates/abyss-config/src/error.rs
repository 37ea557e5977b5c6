//! Configuration error types.

use abyss_terrain::TerrainError;

/// Errors that can occur when loading, saving, or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The generation section describes a world that cannot be built.
    #[error("invalid generation settings: {0}")]
    InvalidSettings(#[from] TerrainError),

    #[error("output.chunk_cells must be at least 1")]
    ZeroChunkCells,
}
