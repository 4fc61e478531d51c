use image::{Rgba, RgbaImage};

use crate::raster::PixelBuffer;
use crate::raster::codec::encode_png;

pub const WHITE: [u8; 3] = [255, 255, 255];
pub const RED: [u8; 3] = [220, 20, 20];
pub const BLUE: [u8; 3] = [30, 60, 200];
pub const GRAY: [u8; 3] = [120, 120, 120];

/// A filled rectangle: x, y, width, height, color
pub type Rect = (u32, u32, u32, u32, [u8; 3]);

/// Creates an opaque image of one color with rectangles painted on top
pub fn create_test_image(width: u32, height: u32, background: [u8; 3], rects: &[Rect]) -> RgbaImage {
    let [r, g, b] = background;
    let mut image = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));
    for &(x, y, w, h, [r, g, b]) in rects {
        for py in y..(y + h).min(height) {
            for px in x..(x + w).min(width) {
                image.put_pixel(px, py, Rgba([r, g, b, 255]));
            }
        }
    }
    image
}

/// Same as `create_test_image`, wrapped in a pixel buffer
pub fn create_test_buffer(width: u32, height: u32, background: [u8; 3], rects: &[Rect]) -> PixelBuffer {
    PixelBuffer::from_rgba(create_test_image(width, height, background, rects))
}

/// Encoded PNG bytes of a synthetic image
pub fn create_test_png(width: u32, height: u32, background: [u8; 3], rects: &[Rect]) -> Vec<u8> {
    encode_png(&create_test_image(width, height, background, rects)).unwrap()
}

/// The 400x300 white page with one 100x60 red block at (50, 50)
pub fn single_block_buffer() -> PixelBuffer {
    create_test_buffer(400, 300, WHITE, &[(50, 50, 100, 60, RED)])
}

/// Whether two pixel boxes match within `slack` pixels on every edge
pub fn roughly_equal(b: &crate::coordinate::BoundingBox, x: u32, y: u32, w: u32, h: u32, slack: u32) -> bool {
    b.x.abs_diff(x) <= slack
        && b.y.abs_diff(y) <= slack
        && b.right().abs_diff(x + w) <= slack
        && b.bottom().abs_diff(y + h) <= slack
}
