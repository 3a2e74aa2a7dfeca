use spincube_backend::{TextureFormat, TextureImage};

/// The image wrapped around every cube face.
///
/// An 8x8 checkerboard with a diagonal colour gradient, so orientation and
/// filtering problems are visible on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanionTexture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl CompanionTexture {
    pub const FORMAT: TextureFormat = TextureFormat::Rgba8888;
    pub const DEFAULT_SIZE: u32 = 128;

    pub fn new() -> Self {
        Self::generate(Self::DEFAULT_SIZE, Self::DEFAULT_SIZE)
    }

    pub fn generate(width: u32, height: u32) -> Self {
        let cell_w = (width / 8).max(1);
        let cell_h = (height / 8).max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let dark = ((x / cell_w) + (y / cell_h)) % 2 == 1;
                let r = (x * 255 / width.max(1)) as u8;
                let g = (y * 255 / height.max(1)) as u8;
                let (r, g, b) = if dark { (r / 3, g / 3, 0x30) } else { (r, g, 0xC0) };
                pixels.extend_from_slice(&[r, g, b, 0xFF]);
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn as_image(&self) -> TextureImage<'_> {
        TextureImage {
            pixels: &self.pixels,
            width: self.width,
            height: self.height,
            format: Self::FORMAT,
            mipmaps: false,
        }
    }
}

impl Default for CompanionTexture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_buffer_matches_dimensions() {
        let tex = CompanionTexture::generate(32, 16);
        let img = tex.as_image();
        assert_eq!(img.pixels.len(), img.expected_len());
        assert_eq!(img.format, TextureFormat::Rgba8888);
    }

    #[test]
    fn checker_cells_alternate() {
        let tex = CompanionTexture::generate(16, 16);
        let blue = |x: usize, y: usize| tex.pixels[(y * 16 + x) * 4 + 2];
        assert_eq!(blue(0, 0), 0xC0);
        assert_eq!(blue(2, 0), 0x30);
        assert_eq!(blue(2, 2), 0xC0);
    }

    #[test]
    fn fully_opaque() {
        let tex = CompanionTexture::new();
        assert!(tex.pixels.chunks(4).all(|p| p[3] == 0xFF));
    }
}
