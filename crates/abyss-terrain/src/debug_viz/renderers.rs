//! Layer renderers: elevation bands, biome colors and navigability masks.

use super::image::DebugImage;
use crate::biome::BiomeCatalog;
use crate::error::TerrainError;
use crate::world::WorldMaps;

/// Navigable cells in the navigability preview.
pub const NAVIGABLE_COLOR: [u8; 3] = [40, 200, 190];
/// Blocked cells in the navigability preview, before height shading.
pub const BLOCKED_COLOR: [u8; 3] = [90, 60, 45];
/// Cells whose biome index is missing from the catalog.
pub const UNKNOWN_BIOME_COLOR: [u8; 3] = [255, 0, 255];

fn lerp_rgb(from: [u8; 3], to: [u8; 3], t: f64) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    [mix(from[0], to[0]), mix(from[1], to[1]), mix(from[2], to[2])]
}

/// Map a normalized seabed height `[0, 1]` to an RGB color.
///
/// Bands, low to high: trench (near black-blue), basin (deep blue),
/// shelf (teal), slope (sandy brown), ridge (pale grey).
pub fn depth_to_color(normalized: f64) -> [u8; 3] {
    let h = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
    if h < 0.15 {
        lerp_rgb([5, 8, 30], [10, 25, 80], h / 0.15)
    } else if h < 0.35 {
        lerp_rgb([10, 25, 80], [20, 90, 140], (h - 0.15) / 0.2)
    } else if h < 0.55 {
        lerp_rgb([20, 90, 140], [60, 140, 130], (h - 0.35) / 0.2)
    } else if h < 0.8 {
        lerp_rgb([150, 120, 80], [120, 95, 70], (h - 0.55) / 0.25)
    } else {
        lerp_rgb([170, 170, 165], [235, 235, 230], (h - 0.8) / 0.2)
    }
}

/// Pixel dimensions for a `width` x `length` grid.
fn image_dimensions(width: usize, length: usize) -> Result<(u32, u32), TerrainError> {
    match (u32::try_from(width), u32::try_from(length)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(TerrainError::ImageTooLarge { width, length }),
    }
}

fn opaque([r, g, b]: [u8; 3]) -> [u8; 4] {
    [r, g, b, 255]
}

/// Elevation preview banded by [`depth_to_color`].
pub fn render_height_debug(maps: &WorldMaps) -> Result<DebugImage, TerrainError> {
    let (width, height) = image_dimensions(maps.width(), maps.length())?;
    Ok(DebugImage::from_fn(width, height, |x, y| {
        opaque(depth_to_color(
            maps.normalized_height_at_world(x as i64, y as i64),
        ))
    }))
}

/// Biome preview using each catalog entry's color.
pub fn render_biome_debug(
    maps: &WorldMaps,
    catalog: &BiomeCatalog,
) -> Result<DebugImage, TerrainError> {
    let (width, height) = image_dimensions(maps.width(), maps.length())?;
    Ok(DebugImage::from_fn(width, height, |x, y| {
        let index = *maps.biomes.get(x as usize, y as usize);
        let rgb = catalog
            .try_get(index)
            .map_or(UNKNOWN_BIOME_COLOR, |b| [b.color.r, b.color.g, b.color.b]);
        opaque(rgb)
    }))
}

/// Navigability mask. Blocked cells darken toward higher ground.
pub fn render_navigability_debug(maps: &WorldMaps) -> Result<DebugImage, TerrainError> {
    let (width, height) = image_dimensions(maps.width(), maps.length())?;
    Ok(DebugImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        if *maps.navigable.get(x, y) {
            opaque(NAVIGABLE_COLOR)
        } else {
            let h = *maps.heights.get(x, y) as f64 / maps.height_scale;
            opaque(lerp_rgb(BLOCKED_COLOR, [30, 20, 15], h))
        }
    }))
}
