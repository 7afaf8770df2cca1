//! Key-sized RGBA pixel buffers.

use crate::color::Rgba;

/// Edge length of a generated key image, in pixels.
pub const KEY_SIZE: u32 = 144;

/// A row-major RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Bitmap {
    /// Creates a `width` x `height` image filled with `background`.
    pub fn new(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![background; (width as usize) * (height as usize)],
        }
    }

    /// A blank key image: [`KEY_SIZE`] square, opaque black.
    pub fn key() -> Self {
        Self::new(KEY_SIZE, KEY_SIZE, Rgba::BLACK)
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    /// Paints a rectangle, clipped to the image bounds.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32, color: Rgba) {
        if x >= self.width || y >= self.height {
            return;
        }
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        let stride = self.width as usize;

        for row in y..y_end {
            let start = row as usize * stride;
            for px in &mut self.pixels[start + x as usize..start + x_end as usize] {
                *px = color;
            }
        }
    }

    /// Paints the whole image.
    pub fn fill(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_black_square() {
        let key = Bitmap::key();
        assert_eq!(key.width(), KEY_SIZE);
        assert_eq!(key.height(), KEY_SIZE);
        assert_eq!(key.pixel(0, 0), Some(Rgba::BLACK));
        assert_eq!(key.pixel(KEY_SIZE, 0), None);
    }

    #[test]
    fn test_fill_rect_is_clipped() {
        let mut img = Bitmap::new(4, 4, Rgba::BLACK);
        img.fill_rect(2, 3, 10, 10, Rgba::RED);

        assert_eq!(img.pixel(1, 3), Some(Rgba::BLACK));
        assert_eq!(img.pixel(2, 3), Some(Rgba::RED));
        assert_eq!(img.pixel(3, 3), Some(Rgba::RED));
        assert_eq!(img.pixel(3, 2), Some(Rgba::BLACK));
    }

    #[test]
    fn test_fill_rect_outside_is_noop() {
        let mut img = Bitmap::new(4, 4, Rgba::BLACK);
        img.fill_rect(5, 5, 2, 2, Rgba::RED);
        assert_eq!(img, Bitmap::new(4, 4, Rgba::BLACK));
    }
}
