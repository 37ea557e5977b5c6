//! Terrain generation error types.

/// Errors raised while validating settings or running a generation pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TerrainError {
    /// World width or length is zero.
    #[error("world dimensions must be positive, got {width}x{length}")]
    InvalidDimensions {
        /// Requested grid width.
        width: usize,
        /// Requested grid length.
        length: usize,
    },

    /// Noise scale is zero, negative, or not finite.
    #[error("noise scale must be a positive finite number, got {0}")]
    InvalidScale(f64),

    /// Octave count of zero would leave nothing to normalize by.
    #[error("noise octave count must be at least 1")]
    ZeroOctaves,

    /// A numeric noise parameter is NaN or infinite.
    #[error("noise parameter `{name}` must be finite, got {value}")]
    NonFiniteParameter {
        /// Field name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },

    /// The height curve has no keys or unordered key times.
    #[error("invalid height curve: {0}")]
    InvalidCurve(String),

    /// Navigable threshold lies outside `[0, 1]`.
    #[error("navigable threshold must lie in [0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    /// Height scale is zero, negative, or not finite.
    #[error("height scale must be a positive finite number, got {0}")]
    InvalidHeightScale(f64),

    /// The passage-width window cannot fit inside the grid.
    #[error(
        "minimum passage width {min_width} leaves no interior cells in a {width}x{length} world"
    )]
    PassageWidthTooLarge {
        /// Requested minimum passage width in cells.
        min_width: usize,
        /// Grid width.
        width: usize,
        /// Grid length.
        length: usize,
    },

    /// The biome catalog is empty.
    #[error("biome catalog must contain at least one biome")]
    EmptyCatalog,

    /// Two catalog entries share a name.
    #[error("duplicate biome name: {0}")]
    DuplicateBiome(String),

    /// A biome's height range or climate targets are malformed.
    #[error("biome `{name}` is invalid: {reason}")]
    InvalidBiome {
        /// Biome name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },

    /// A preview image dimension does not fit in `u32`.
    #[error("a {width}x{length} world is too large for a preview image")]
    ImageTooLarge {
        /// Grid width.
        width: usize,
        /// Grid length.
        length: usize,
    },

    /// The pass was cancelled through its [`CancelToken`](crate::CancelToken).
    #[error("generation cancelled during {0} phase")]
    Cancelled(crate::Phase),
}
