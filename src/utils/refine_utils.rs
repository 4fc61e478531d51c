//! Boundary refinement
//!
//! Snaps an approximate box (typically from an oracle) to the strongest
//! luminance edges near each of its sides.

use log::debug;

use crate::coordinate::{BoundingBox, MIN_REGION_SIZE};
use crate::raster::PixelBuffer;

/// Default luminance step that counts as an edge
pub const DEFAULT_EDGE_THRESHOLD: f64 = 30.0;

/// Pixels added around the box when searching for edges
const SEARCH_PADDING: u32 = 10;

/// Which side of the box a scan is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

/// Snap a box to nearby luminance edges
///
/// Each side is searched independently inside a window padded by 10px. A
/// column (or row) is an edge when more than a quarter of the box's span
/// shows a luminance step above `threshold` across it. Sides without an
/// edge keep their original coordinate. The result is never smaller than
/// 4px on either axis and always lies inside the image; degenerate input
/// is returned unchanged.
///
/// # Arguments
/// * `buffer` - The decoded image
/// * `bbox` - Approximate box in pixel coordinates
/// * `threshold` - Minimum luminance difference for an edge
///
/// # Returns
/// The refined box in pixel coordinates
pub fn refine_bounds(buffer: &PixelBuffer, bbox: &BoundingBox, threshold: f64) -> BoundingBox {
    let img_w = buffer.width();
    let img_h = buffer.height();

    if img_w < 3 || img_h < 3 || bbox.width == 0 || bbox.height == 0
        || bbox.x >= img_w || bbox.y >= img_h {
        return *bbox;
    }

    let clamped = bbox.clamp_to(img_w, img_h);

    let left = scan_edge(buffer, &clamped, Side::Left, threshold).unwrap_or(clamped.x);
    let right = scan_edge(buffer, &clamped, Side::Right, threshold).unwrap_or(clamped.right());
    let top = scan_edge(buffer, &clamped, Side::Top, threshold).unwrap_or(clamped.y);
    let bottom = scan_edge(buffer, &clamped, Side::Bottom, threshold).unwrap_or(clamped.bottom());

    let width = right.saturating_sub(left).max(MIN_REGION_SIZE);
    let height = bottom.saturating_sub(top).max(MIN_REGION_SIZE);

    let refined = BoundingBox::new(left, top, width, height).clamp_to(img_w, img_h);
    if !refined.is_valid() {
        return *bbox;
    }

    debug!("Refined ({}, {}, {}x{}) to ({}, {}, {}x{})",
           bbox.x, bbox.y, bbox.width, bbox.height,
           refined.x, refined.y, refined.width, refined.height);
    refined
}

/// Search one side of the box for an edge
///
/// Returns the refined coordinate: an inclusive start for left/top and an
/// exclusive end for right/bottom.
fn scan_edge(buffer: &PixelBuffer, bbox: &BoundingBox, side: Side, threshold: f64) -> Option<u32> {
    let img_w = buffer.width();
    let img_h = buffer.height();

    let horizontal = matches!(side, Side::Left | Side::Right);
    let (limit, span_start, span_end, origin, extent) = if horizontal {
        (img_w, bbox.y, bbox.bottom(), bbox.x, bbox.width)
    } else {
        (img_h, bbox.x, bbox.right(), bbox.y, bbox.height)
    };

    let span = span_end.saturating_sub(span_start);
    if span == 0 {
        return None;
    }

    let search_start = origin.saturating_sub(SEARCH_PADDING).max(1);
    let search_end = (origin + extent + SEARCH_PADDING).min(limit.saturating_sub(2));

    let is_edge = |position: u32| -> bool {
        let mut hits = 0u32;
        for s in span_start..span_end {
            let (before, after) = if horizontal {
                (buffer.luminance(position - 1, s), buffer.luminance(position + 1, s))
            } else {
                (buffer.luminance(s, position - 1), buffer.luminance(s, position + 1))
            };
            if (before - after).abs() > threshold {
                hits += 1;
            }
        }
        hits as f64 > span as f64 / 4.0
    };

    match side {
        Side::Left | Side::Top => {
            let last = (origin + extent / 3).min(search_end);
            // The neighbour test fires one line before the content starts
            (search_start..=last).find(|&p| is_edge(p)).map(|p| p + 1)
        }
        Side::Right | Side::Bottom => {
            let first = (origin + 2 * extent / 3).max(search_start);
            if first > search_end {
                return None;
            }
            (first..=search_end).rev().find(|&p| is_edge(p))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn image_with_block(x0: u32, y0: u32, w: u32, h: u32) -> PixelBuffer {
        let mut img = RgbaImage::from_pixel(200, 200, Rgba([255, 255, 255, 255]));
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        PixelBuffer::from_rgba(img)
    }

    #[test]
    fn test_refine_snaps_loose_box() {
        let buffer = image_with_block(50, 50, 100, 60);
        let loose = BoundingBox::new(45, 45, 110, 70);
        let refined = refine_bounds(&buffer, &loose, DEFAULT_EDGE_THRESHOLD);
        assert_eq!(refined, BoundingBox::new(50, 50, 100, 60));
    }

    #[test]
    fn test_refine_snaps_tight_box_outwards() {
        let buffer = image_with_block(50, 50, 100, 60);
        let tight = BoundingBox::new(54, 53, 92, 54);
        let refined = refine_bounds(&buffer, &tight, DEFAULT_EDGE_THRESHOLD);
        assert_eq!(refined, BoundingBox::new(50, 50, 100, 60));
    }

    #[test]
    fn test_refine_without_edges_keeps_box() {
        let buffer = PixelBuffer::from_rgba(RgbaImage::from_pixel(100, 100, Rgba([9, 9, 9, 255])));
        let bbox = BoundingBox::new(10, 10, 30, 30);
        assert_eq!(refine_bounds(&buffer, &bbox, DEFAULT_EDGE_THRESHOLD), bbox);
    }

    #[test]
    fn test_refine_degenerate_inputs() {
        let tiny = PixelBuffer::from_rgba(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])));
        let bbox = BoundingBox::new(0, 0, 1, 1);
        assert_eq!(refine_bounds(&tiny, &bbox, DEFAULT_EDGE_THRESHOLD), bbox);

        let buffer = image_with_block(50, 50, 100, 60);
        let outside = BoundingBox::new(500, 500, 10, 10);
        assert_eq!(refine_bounds(&buffer, &outside, DEFAULT_EDGE_THRESHOLD), outside);
    }
}
