//! Color primitives and background estimation
//!
//! Two metrics are used across the detectors: a per-channel (Chebyshev
//! style) similarity test for foreground/background classification, and a
//! Euclidean distance used only when comparing the uniformity of rows.

use std::collections::HashMap;
use std::fmt;

use image::Rgba;
use log::debug;

use crate::raster::PixelBuffer;

/// Number of evenly spaced samples taken along each border edge
const BORDER_SAMPLES: u32 = 20;

/// Channel bucket width used when voting for the background color
const BUCKET_SIZE: u32 = 10;

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Build a color from an RGBA pixel, ignoring alpha
    pub fn from_rgba(pixel: &Rgba<u8>) -> Self {
        Color::new(pixel[0], pixel[1], pixel[2])
    }

    /// Average of the three channels
    pub fn gray(&self) -> f64 {
        (self.r as f64 + self.g as f64 + self.b as f64) / 3.0
    }

    /// Perceptual luminance (Rec. 601 weights)
    pub fn luminance(&self) -> f64 {
        0.299 * self.r as f64 + 0.587 * self.g as f64 + 0.114 * self.b as f64
    }

    /// Hex representation, e.g. `#ff8800`
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// True iff every channel differs by at most `tolerance`
pub fn colors_similar(a: Color, b: Color, tolerance: u8) -> bool {
    let tol = tolerance as i16;
    (a.r as i16 - b.r as i16).abs() <= tol
        && (a.g as i16 - b.g as i16).abs() <= tol
        && (a.b as i16 - b.b as i16).abs() <= tol
}

/// Euclidean distance in RGB space
pub fn color_distance(a: Color, b: Color) -> f64 {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

fn bucket(channel: u8) -> u8 {
    let rounded = ((channel as u32 + BUCKET_SIZE / 2) / BUCKET_SIZE) * BUCKET_SIZE;
    rounded.min(255) as u8
}

/// Estimate the dominant background color of an image
///
/// Samples the four corners plus evenly spaced points along every border
/// edge, buckets each sample's channels to the nearest multiple of ten and
/// votes. The winning bucket's samples are averaged to produce the
/// representative color. Ties go to the bucket seen first.
pub fn estimate_background(buffer: &PixelBuffer) -> Color {
    let width = buffer.width();
    let height = buffer.height();
    if width == 0 || height == 0 {
        return Color::default();
    }

    let max_x = width - 1;
    let max_y = height - 1;

    let mut samples = vec![
        buffer.color(0, 0),
        buffer.color(max_x, 0),
        buffer.color(0, max_y),
        buffer.color(max_x, max_y),
    ];

    for i in 0..BORDER_SAMPLES {
        let sx = (i as u64 * max_x as u64 / (BORDER_SAMPLES - 1) as u64) as u32;
        let sy = (i as u64 * max_y as u64 / (BORDER_SAMPLES - 1) as u64) as u32;
        samples.push(buffer.color(sx, 0));
        samples.push(buffer.color(sx, max_y));
        samples.push(buffer.color(0, sy));
        samples.push(buffer.color(max_x, sy));
    }

    let mut order: Vec<(u8, u8, u8)> = Vec::new();
    let mut votes: HashMap<(u8, u8, u8), Vec<Color>> = HashMap::new();
    for sample in samples {
        let key = (bucket(sample.r), bucket(sample.g), bucket(sample.b));
        let entry = votes.entry(key).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        entry.push(sample);
    }

    let mut best: Option<&Vec<Color>> = None;
    for key in &order {
        let members = &votes[key];
        if best.map_or(true, |b| members.len() > b.len()) {
            best = Some(members);
        }
    }

    let members = match best {
        Some(m) if !m.is_empty() => m,
        _ => return Color::default(),
    };

    let count = members.len() as u32;
    let (sr, sg, sb) = members.iter().fold((0u32, 0u32, 0u32), |acc, c| {
        (acc.0 + c.r as u32, acc.1 + c.g as u32, acc.2 + c.b as u32)
    });
    let background = Color::new(
        ((sr + count / 2) / count) as u8,
        ((sg + count / 2) / count) as u8,
        ((sb + count / 2) / count) as u8,
    );

    debug!("Estimated background color {} from {} of {} samples",
           background, count, 4 + 4 * BORDER_SAMPLES);
    background
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_colors_similar_is_per_channel() {
        let a = Color::new(100, 100, 100);
        assert!(colors_similar(a, Color::new(110, 90, 105), 10));
        assert!(!colors_similar(a, Color::new(111, 100, 100), 10));
        // Euclidean distance would exceed 10 here, the per-channel test does not
        assert!(colors_similar(a, Color::new(108, 108, 108), 10));
    }

    #[test]
    fn test_color_distance() {
        let d = color_distance(Color::new(0, 0, 0), Color::new(3, 4, 0));
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bucket_clamps_high_values() {
        assert_eq!(bucket(255), 255);
        assert_eq!(bucket(254), 250);
        assert_eq!(bucket(14), 10);
        assert_eq!(bucket(15), 20);
    }

    #[test]
    fn test_estimate_background_prefers_border_majority() {
        let mut img = RgbaImage::from_pixel(60, 40, Rgba([240, 240, 240, 255]));
        // A dark block touching one corner must not win the vote
        for y in 0..10 {
            for x in 0..10 {
                img.put_pixel(x, y, Rgba([10, 10, 10, 255]));
            }
        }
        let buffer = PixelBuffer::from_rgba(img);
        assert_eq!(estimate_background(&buffer), Color::new(240, 240, 240));
    }

    #[test]
    fn test_estimate_background_single_pixel() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([7, 8, 9, 255]));
        let buffer = PixelBuffer::from_rgba(img);
        assert_eq!(estimate_background(&buffer), Color::new(7, 8, 9));
    }
}
