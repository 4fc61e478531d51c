//! Canvas cropping and encoding helpers
//!
//! Thin wrappers over the `image` crate used by the cropper and by the
//! oracle strategy to describe the source bytes.

use std::io::Cursor;
use std::path::Path;

use image::{imageops, ImageFormat, RgbaImage};

use crate::coordinate::BoundingBox;
use crate::errors::{RegionError, RegionResult};

use super::PixelBuffer;

/// Copy a clamped pixel rectangle into a new canvas of exactly that size
///
/// Alpha is preserved. The box must already lie inside the buffer.
pub fn crop_canvas(buffer: &PixelBuffer, bbox: &BoundingBox) -> RgbaImage {
    imageops::crop_imm(buffer.as_rgba(), bbox.x, bbox.y, bbox.width, bbox.height).to_image()
}

/// Encode an RGBA canvas as lossless PNG
pub fn encode_png(canvas: &RgbaImage) -> RegionResult<Vec<u8>> {
    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RegionError::EncodeError(e.to_string()))?;
    Ok(bytes)
}

/// Guess the MIME type of encoded image bytes
///
/// Falls back to `application/octet-stream` for unknown signatures.
pub fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}

/// Ensure a file name ends with `.png`
///
/// # Arguments
/// * `file_name` - The proposed file name
///
/// # Returns
/// The name unchanged if it already has a PNG extension, otherwise the
/// stem with `.png` appended
pub fn ensure_png_extension(file_name: &str) -> String {
    let path = Path::new(file_name);

    if let Some(ext) = path.extension() {
        if ext.to_string_lossy().to_lowercase() == "png" {
            return file_name.to_string();
        }
    }

    let stem = path.file_stem().unwrap_or_default();
    format!("{}.png", stem.to_string_lossy())
}
