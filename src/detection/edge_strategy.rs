//! Sobel-edge connected components
//!
//! Builds a binary edge map from the Sobel gradient magnitude and groups
//! 8-connected edge pixels into components.

use std::collections::VecDeque;

use log::{debug, info};

use crate::coordinate::{BoundingBox, PixelMask};
use crate::errors::RegionResult;
use crate::raster::PixelBuffer;
use crate::utils::merge_utils::merge_until_stable;
use crate::utils::shape_utils::{classify_shape, GENERIC_PROFILE};

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Confidence reported for edge components
const EDGE_CONFIDENCE: f64 = 0.65;

/// Gap in pixels across which two components are merged
const MERGE_MARGIN: u32 = 5;

/// Edge component detector
#[derive(Debug, Clone)]
pub struct EdgeStrategy {
    /// Minimum width and height of a kept component
    pub min_size: u32,
    /// Gradient magnitude above which a pixel is an edge
    pub threshold: f64,
}

impl EdgeStrategy {
    pub fn new(min_size: u32, threshold: f64) -> Self {
        EdgeStrategy { min_size, threshold }
    }

    /// Binary edge map; border pixels are never edges
    pub fn edge_map(&self, buffer: &PixelBuffer) -> PixelMask {
        let width = buffer.width();
        let height = buffer.height();
        let mut edges = PixelMask::new(width, height);
        if width < 3 || height < 3 {
            return edges;
        }

        let gray = buffer.grayscale();
        let w = width as usize;
        let at = |x: u32, y: u32| gray[y as usize * w + x as usize];

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let gx = -at(x - 1, y - 1) + at(x + 1, y - 1)
                    - 2.0 * at(x - 1, y) + 2.0 * at(x + 1, y)
                    - at(x - 1, y + 1) + at(x + 1, y + 1);
                let gy = -at(x - 1, y - 1) - 2.0 * at(x, y - 1) - at(x + 1, y - 1)
                    + at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1);

                if (gx * gx + gy * gy).sqrt() > self.threshold {
                    edges.set(x, y, true);
                }
            }
        }

        edges
    }

    /// Bounding boxes of large edge components, merged
    pub fn detect_boxes(&self, buffer: &PixelBuffer) -> Vec<BoundingBox> {
        let edges = self.edge_map(buffer);
        debug!("Edge map has {} edge pixels", edges.count());

        let mut visited = PixelMask::new(buffer.width(), buffer.height());
        let mut boxes = Vec::new();

        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                if !edges.get(x, y) || visited.get(x, y) {
                    continue;
                }
                let component = trace_component_8(&edges, &mut visited, x, y);
                if component.width >= self.min_size && component.height >= self.min_size {
                    boxes.push(component);
                }
            }
        }

        debug!("Found {} raw edge components", boxes.len());
        merge_until_stable(boxes, 0.0, MERGE_MARGIN)
    }
}

/// Breadth-first fill of one 8-connected component
fn trace_component_8(edges: &PixelMask, visited: &mut PixelMask, start_x: u32, start_y: u32) -> BoundingBox {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (start_x, start_y, start_x, start_y);
    let mut queue = VecDeque::new();
    visited.set(start_x, start_y, true);
    queue.push_back((start_x, start_y));

    while let Some((x, y)) = queue.pop_front() {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);

        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 {
                    continue;
                }
                let (nx, ny) = (nx as u32, ny as u32);
                if edges.get(nx, ny) && !visited.get(nx, ny) {
                    visited.set(nx, ny, true);
                    queue.push_back((nx, ny));
                }
            }
        }
    }

    BoundingBox::from_extremes(min_x, min_y, max_x, max_y)
}

impl DetectorStrategy for EdgeStrategy {
    fn name(&self) -> &'static str {
        "components"
    }

    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let regions: Vec<DetectedRegion> = self.detect_boxes(buffer)
            .into_iter()
            .filter(|b| b.is_valid())
            .map(|b| {
                let shape = classify_shape(GENERIC_PROFILE, &b);
                DetectedRegion::new(b.with_image_size(buffer.width(), buffer.height()),
                                    RegionSource::Edge, EDGE_CONFIDENCE)
                    .with_description(format!("Outlined {} at ({}, {})", shape, b.x, b.y))
                    .with_shape(shape)
            })
            .collect();

        info!("Edge component detection found {} region(s)", regions.len());
        Ok(regions)
    }
}
