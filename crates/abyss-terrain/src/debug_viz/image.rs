//! Row-major RGBA pixel buffer.

use hashbrown::HashSet;

/// An RGBA image sized to a world grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, row-major.
    pub pixels: Vec<u8>,
}

impl DebugImage {
    /// Transparent black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Build an image by evaluating `color` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut color: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.set_pixel(x, y, color(x, y));
            }
        }
        image
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * 4
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Distinct RGB triples, alpha ignored.
    pub fn unique_color_count(&self) -> usize {
        self.pixels
            .chunks_exact(4)
            .map(|p| (p[0], p[1], p[2]))
            .collect::<HashSet<_>>()
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_image_is_zeroed() {
        let image = DebugImage::new(12, 5);
        assert_eq!(image.dimensions(), (12, 5));
        assert_eq!(image.pixels.len(), 12 * 5 * 4);
        assert!(image.pixels.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pixel_layout_is_row_major() {
        let mut image = DebugImage::new(10, 10);
        image.set_pixel(3, 5, [255, 128, 64, 200]);

        let idx = (5 * 10 + 3) * 4;
        assert_eq!(&image.pixels[idx..idx + 4], &[255, 128, 64, 200]);
        assert_eq!(image.get_pixel(3, 5), [255, 128, 64, 200]);
    }

    #[test]
    fn test_from_fn_visits_every_pixel() {
        let image = DebugImage::from_fn(3, 2, |x, y| [x as u8, y as u8, 0, 255]);
        assert_eq!(image.get_pixel(2, 1), [2, 1, 0, 255]);
        assert_eq!(image.get_pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(image.unique_color_count(), 6);
    }

    #[test]
    fn test_unique_colors_ignore_alpha() {
        let mut image = DebugImage::new(4, 1);
        image.set_pixel(0, 0, [255, 0, 0, 255]);
        image.set_pixel(1, 0, [0, 255, 0, 255]);
        image.set_pixel(2, 0, [255, 0, 0, 10]);
        image.set_pixel(3, 0, [0, 0, 255, 255]);
        assert_eq!(image.unique_color_count(), 3);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_out_of_bounds_pixel_panics() {
        let mut image = DebugImage::new(2, 2);
        image.set_pixel(2, 0, [0; 4]);
    }
}
