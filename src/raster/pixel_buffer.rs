//! Decoded pixel storage
//!
//! A `PixelBuffer` owns the RGBA samples of one decoded image. It is created
//! per extraction call and handed to every detector as a read-only view.

use image::{DynamicImage, RgbaImage};
use log::debug;

use crate::coordinate::Color;
use crate::errors::{RegionError, RegionResult};

/// Read-only RGBA pixel storage for a decoded image
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    /// Decode raster bytes in any format the image codec recognises
    ///
    /// # Arguments
    /// * `bytes` - Encoded image bytes (PNG, JPEG, GIF, BMP, WebP, ...)
    ///
    /// # Returns
    /// A decoded buffer, or `DecodeError` when the bytes are not an image
    pub fn decode(bytes: &[u8]) -> RegionResult<Self> {
        if bytes.is_empty() {
            return Err(RegionError::DecodeError("empty image data".to_string()));
        }

        let image = image::load_from_memory(bytes)
            .map_err(|e| RegionError::DecodeError(e.to_string()))?;

        debug!("Decoded {}x{} image ({:?})", image.width(), image.height(), image.color());
        Ok(PixelBuffer::from_dynamic(image))
    }

    /// Wrap an already decoded image
    pub fn from_dynamic(image: DynamicImage) -> Self {
        PixelBuffer { image: image.to_rgba8() }
    }

    /// Wrap an RGBA image without conversion
    pub fn from_rgba(image: RgbaImage) -> Self {
        PixelBuffer { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Whether `(x, y)` is inside the image
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height()
    }

    /// RGB color at `(x, y)`; callers must stay inside the image
    #[inline]
    pub fn color(&self, x: u32, y: u32) -> Color {
        Color::from_rgba(self.image.get_pixel(x, y))
    }

    /// Perceptual luminance at `(x, y)`
    #[inline]
    pub fn luminance(&self, x: u32, y: u32) -> f64 {
        self.color(x, y).luminance()
    }

    /// Channel-average grayscale plane in row-major order
    pub fn grayscale(&self) -> Vec<f64> {
        self.image
            .pixels()
            .map(|p| Color::from_rgba(p).gray())
            .collect()
    }

    /// Borrow the underlying RGBA image
    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_decode_rejects_garbage() {
        let result = PixelBuffer::decode(b"definitely not an image");
        assert!(matches!(result, Err(RegionError::DecodeError(_))));
        assert!(matches!(PixelBuffer::decode(&[]), Err(RegionError::DecodeError(_))));
    }

    #[test]
    fn test_grayscale_is_channel_average() {
        let img = RgbaImage::from_pixel(2, 1, Rgba([30, 60, 90, 255]));
        let buffer = PixelBuffer::from_rgba(img);
        assert_eq!(buffer.grayscale(), vec![60.0, 60.0]);
    }
}
