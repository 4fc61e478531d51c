//! Background-subtraction contour detection
//!
//! Classifies every pixel as foreground or background against the estimated
//! background color, then collects 4-connected foreground components.

use std::collections::VecDeque;

use log::{debug, info};

use crate::coordinate::{BoundingBox, PixelMask, colors_similar, estimate_background};
use crate::errors::RegionResult;
use crate::raster::PixelBuffer;
use crate::utils::merge_utils::merge_until_stable;
use crate::utils::shape_utils::{classify_shape, GENERIC_PROFILE};

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Confidence reported for contour regions
const CONTOUR_CONFIDENCE: f64 = 0.7;

/// Overlap fraction above which two components are merged
const MERGE_OVERLAP: f64 = 0.3;

/// Gap in pixels across which two components are merged
const MERGE_MARGIN: u32 = 5;

/// Foreground component detector
#[derive(Debug, Clone)]
pub struct ContourStrategy {
    /// Minimum width and height of a kept component
    pub min_size: u32,
    /// Per-channel tolerance for background pixels
    pub color_threshold: u8,
}

impl ContourStrategy {
    pub fn new(min_size: u32, color_threshold: u8) -> Self {
        ContourStrategy { min_size, color_threshold }
    }

    /// Boolean foreground mask: true where a pixel differs from the background
    pub fn foreground_mask(&self, buffer: &PixelBuffer) -> PixelMask {
        let background = estimate_background(buffer);
        PixelMask::from_fn(buffer.width(), buffer.height(), |x, y| {
            !colors_similar(buffer.color(x, y), background, self.color_threshold)
        })
    }

    /// Bounding boxes of all sufficiently large foreground components, merged
    pub fn detect_boxes(&self, buffer: &PixelBuffer) -> Vec<BoundingBox> {
        let width = buffer.width();
        let height = buffer.height();
        let mask = self.foreground_mask(buffer);
        debug!("Foreground mask has {} of {} pixels set", mask.count(), width as u64 * height as u64);

        let mut visited = PixelMask::new(width, height);
        let mut boxes = Vec::new();

        for y in 0..height {
            for x in 0..width {
                if !mask.get(x, y) || visited.get(x, y) {
                    continue;
                }

                let component = trace_component(&mask, &mut visited, x, y);
                if component.width >= self.min_size && component.height >= self.min_size {
                    boxes.push(component.tighten(&mask));
                }
            }
        }

        debug!("Found {} raw components", boxes.len());
        merge_until_stable(boxes, MERGE_OVERLAP, MERGE_MARGIN)
    }
}

/// Breadth-first fill of one 4-connected foreground component
fn trace_component(mask: &PixelMask, visited: &mut PixelMask, start_x: u32, start_y: u32) -> BoundingBox {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (start_x, start_y, start_x, start_y);
    let mut queue = VecDeque::new();
    visited.set(start_x, start_y, true);
    queue.push_back((start_x, start_y));

    while let Some((x, y)) = queue.pop_front() {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);

        let neighbours = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbours {
            // Out-of-range (including wrapped) coordinates read as unset
            if mask.get(nx, ny) && !visited.get(nx, ny) {
                visited.set(nx, ny, true);
                queue.push_back((nx, ny));
            }
        }
    }

    BoundingBox::from_extremes(min_x, min_y, max_x, max_y)
}

impl DetectorStrategy for ContourStrategy {
    fn name(&self) -> &'static str {
        "contour"
    }

    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let regions: Vec<DetectedRegion> = self.detect_boxes(buffer)
            .into_iter()
            .filter(|b| b.is_valid())
            .map(|b| {
                let shape = classify_shape(GENERIC_PROFILE, &b);
                DetectedRegion::new(b.with_image_size(buffer.width(), buffer.height()),
                                    RegionSource::Contour, CONTOUR_CONFIDENCE)
                    .with_description(format!("Foreground {} at ({}, {})", shape, b.x, b.y))
                    .with_shape(shape)
            })
            .collect();

        info!("Contour detection found {} region(s)", regions.len());
        Ok(regions)
    }
}
