//! PNG previews of generated worlds.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use abyss_terrain::biome::BiomeCatalog;
use abyss_terrain::debug_viz::{
    DebugImage, render_biome_debug, render_height_debug, render_navigability_debug,
};
use abyss_terrain::WorldMaps;

use crate::WorldgenError;

/// Encode `image` as an 8-bit RGBA PNG.
pub fn encode_png<W: Write>(out: W, image: &DebugImage) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(out, image.width, image.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&image.pixels)?;
    writer.finish()
}

fn write_png(path: &Path, image: &DebugImage) -> Result<(), WorldgenError> {
    let file = File::create(path).map_err(|e| WorldgenError::Io(path.to_path_buf(), e))?;
    encode_png(BufWriter::new(file), image).map_err(|e| WorldgenError::Png(path.to_path_buf(), e))
}

/// Write `height.png`, `biome.png` and `navigability.png` into `dir`.
pub fn write_previews(
    dir: &Path,
    maps: &WorldMaps,
    catalog: &BiomeCatalog,
) -> Result<Vec<PathBuf>, WorldgenError> {
    std::fs::create_dir_all(dir).map_err(|e| WorldgenError::Io(dir.to_path_buf(), e))?;

    let images = [
        ("height.png", render_height_debug(maps)?),
        ("biome.png", render_biome_debug(maps, catalog)?),
        ("navigability.png", render_navigability_debug(maps)?),
    ];
    let mut written = Vec::with_capacity(images.len());
    for (name, image) in &images {
        let path = dir.join(name);
        write_png(&path, image)?;
        tracing::debug!(path = %path.display(), "preview written");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abyss_terrain::{WorldGenerator, WorldSettings};

    #[test]
    fn test_encode_png_header() {
        let mut image = DebugImage::new(3, 2);
        image.set_pixel(1, 1, [10, 20, 30, 255]);
        let mut buf = Vec::new();
        encode_png(&mut buf, &image).unwrap();
        assert_eq!(&buf[..8], b"\x89PNG\r\n\x1a\n", "missing PNG signature");

        let decoder = png::Decoder::new(std::io::Cursor::new(buf));
        let reader = decoder.read_info().unwrap();
        let info = reader.info();
        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(info.color_type, png::ColorType::Rgba);
    }

    #[test]
    fn test_write_previews_creates_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("previews");
        let settings = WorldSettings {
            width: 24,
            length: 16,
            min_passage_width: 2,
            ..Default::default()
        };
        let catalog = settings.catalog.clone();
        let (maps, _) = WorldGenerator::new(settings).unwrap().generate().unwrap();

        let written = write_previews(&out, &maps, &catalog).unwrap();
        assert_eq!(written.len(), 3);
        for name in ["height.png", "biome.png", "navigability.png"] {
            let path = out.join(name);
            let len = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            assert!(len > 8, "{} should be a non-empty PNG", path.display());
        }
    }
}
