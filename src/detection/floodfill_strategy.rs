//! Flood-fill color region detection
//!
//! Seeds a bounded flood fill from a sparse grid of non-background pixels
//! and keeps the bounding boxes of large enough color regions.

use std::collections::VecDeque;

use log::{debug, info};

use crate::coordinate::{BoundingBox, Color, PixelMask, colors_similar, estimate_background};
use crate::errors::RegionResult;
use crate::raster::PixelBuffer;
use crate::utils::shape_utils::{classify_shape, GENERIC_PROFILE};

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Confidence reported for flood-fill regions
const FLOODFILL_CONFIDENCE: f64 = 0.6;

/// Seed spacing on both axes
const SEED_STRIDE: usize = 2;

/// Extra tolerance granted to neighbours compared with the seed color
const NEIGHBOUR_SLACK: u8 = 20;

/// Overlap fraction above which two regions are duplicates
const DUPLICATE_OVERLAP: f64 = 0.5;

/// Color region detector
#[derive(Debug, Clone)]
pub struct FloodFillStrategy {
    /// Minimum width and height of a kept region
    pub min_size: u32,
    /// Per-channel tolerance; neighbours get this plus 20
    pub tolerance: u8,
    /// Upper bound on pixels visited by one fill
    pub max_pixels: usize,
}

impl FloodFillStrategy {
    pub fn new(min_size: u32, tolerance: u8, max_pixels: usize) -> Self {
        FloodFillStrategy { min_size, tolerance, max_pixels }
    }

    /// Bounding boxes of all distinct color regions
    pub fn detect_boxes(&self, buffer: &PixelBuffer) -> Vec<BoundingBox> {
        let width = buffer.width();
        let height = buffer.height();
        let background = estimate_background(buffer);
        let fill_tolerance = self.tolerance.saturating_add(NEIGHBOUR_SLACK);

        let mut visited = PixelMask::new(width, height);
        let mut kept: Vec<BoundingBox> = Vec::new();

        for y in (0..height).step_by(SEED_STRIDE) {
            for x in (0..width).step_by(SEED_STRIDE) {
                if visited.get(x, y) {
                    continue;
                }
                let seed = buffer.color(x, y);
                if colors_similar(seed, background, self.tolerance) {
                    continue;
                }

                let region = self.fill(buffer, &mut visited, x, y, seed, fill_tolerance);
                if region.width < self.min_size || region.height < self.min_size {
                    continue;
                }

                match kept.iter().position(|k| k.significant_overlap(&region, DUPLICATE_OVERLAP)) {
                    Some(i) => {
                        if region.area() > kept[i].area() {
                            debug!("Replacing region {} with larger duplicate", i);
                            kept[i] = region;
                        }
                    }
                    None => kept.push(region),
                }
            }
        }

        kept
    }

    /// Breadth-first fill from a seed, bounded by `max_pixels`
    fn fill(&self, buffer: &PixelBuffer, visited: &mut PixelMask,
            start_x: u32, start_y: u32, seed: Color, tolerance: u8) -> BoundingBox {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (start_x, start_y, start_x, start_y);
        let mut queue = VecDeque::new();
        let mut count = 1usize;
        visited.set(start_x, start_y, true);
        queue.push_back((start_x, start_y));

        while let Some((x, y)) = queue.pop_front() {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            if count >= self.max_pixels {
                continue;
            }

            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if count >= self.max_pixels {
                    break;
                }
                if !buffer.contains(nx, ny) || visited.get(nx, ny) {
                    continue;
                }
                if colors_similar(buffer.color(nx, ny), seed, tolerance) {
                    visited.set(nx, ny, true);
                    count += 1;
                    queue.push_back((nx, ny));
                }
            }
        }

        if count >= self.max_pixels {
            debug!("Flood fill from ({}, {}) hit the {} pixel cap", start_x, start_y, self.max_pixels);
        }

        BoundingBox::from_extremes(min_x, min_y, max_x, max_y)
    }
}

impl DetectorStrategy for FloodFillStrategy {
    fn name(&self) -> &'static str {
        "floodfill"
    }

    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let mut boxes: Vec<BoundingBox> = self.detect_boxes(buffer)
            .into_iter()
            .filter(|b| b.is_valid())
            .collect();
        boxes.sort_by_key(|b| (b.y, b.x));

        let regions: Vec<DetectedRegion> = boxes
            .into_iter()
            .map(|b| {
                let shape = classify_shape(GENERIC_PROFILE, &b);
                DetectedRegion::new(b.with_image_size(buffer.width(), buffer.height()),
                                    RegionSource::FloodFill, FLOODFILL_CONFIDENCE)
                    .with_description(format!("Color region {} at ({}, {})", shape, b.x, b.y))
                    .with_shape(shape)
            })
            .collect();

        info!("Flood-fill detection found {} region(s)", regions.len());
        Ok(regions)
    }
}
