//! Preview rendering of generated worlds.
//!
//! Each renderer maps one [`WorldMaps`](crate::WorldMaps) layer to a
//! [`DebugImage`] with one pixel per grid cell, row 0 at the top.

mod image;
mod renderers;

pub use self::image::DebugImage;
pub use renderers::{
    BLOCKED_COLOR, NAVIGABLE_COLOR, UNKNOWN_BIOME_COLOR, depth_to_color, render_biome_debug,
    render_height_debug, render_navigability_debug,
};
