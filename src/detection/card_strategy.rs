//! Solid-color UI card detection
//!
//! Looks for maximal axis-aligned rectangles of near-uniform color, the
//! typical shape of cards, panels and tiles in flat UI screenshots.

use log::{debug, info};

use crate::coordinate::{BoundingBox, Color, PixelMask, colors_similar, estimate_background};
use crate::errors::RegionResult;
use crate::raster::PixelBuffer;
use crate::utils::merge_utils::merge_until_stable;
use crate::utils::shape_utils::{classify_shape, CARD_PROFILE};

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Confidence reported for card regions
const CARD_CONFIDENCE: f64 = 0.75;

/// Seed grid spacing
const SEED_STRIDE: usize = 10;

/// Offset of the first seed from the top-left corner
const SEED_INSET: u32 = 5;

/// Side of the square patch that must be uniform around a seed
const PATCH_SIZE: u32 = 20;

/// Tolerance for the interior patch and for background seeds
const PATCH_TOLERANCE: u8 = 20;

/// Tolerance while extending the rectangle outwards
const EXTEND_TOLERANCE: u8 = 25;

/// Overlap fraction above which a new card duplicates a kept one
const DUPLICATE_OVERLAP: f64 = 0.7;

/// Overlap fraction and gap used by the final merge pass
const MERGE_OVERLAP: f64 = 0.3;
const MERGE_MARGIN: u32 = 5;

/// Solid-color rectangle detector
#[derive(Debug, Clone)]
pub struct CardStrategy {
    /// Minimum width and height of a kept card
    pub min_size: u32,
}

impl CardStrategy {
    pub fn new(min_size: u32) -> Self {
        CardStrategy { min_size }
    }

    /// Card rectangles, merged and sorted by area (largest first)
    pub fn detect_boxes(&self, buffer: &PixelBuffer) -> Vec<BoundingBox> {
        let width = buffer.width();
        let height = buffer.height();
        let background = estimate_background(buffer);

        let mut visited = PixelMask::new(width, height);
        let mut cards: Vec<BoundingBox> = Vec::new();

        for y in (SEED_INSET..height).step_by(SEED_STRIDE) {
            for x in (SEED_INSET..width).step_by(SEED_STRIDE) {
                if visited.get(x, y) {
                    continue;
                }
                let seed = buffer.color(x, y);
                if colors_similar(seed, background, PATCH_TOLERANCE) {
                    continue;
                }
                if !is_solid_patch(buffer, x, y, seed) {
                    continue;
                }

                let card = extend_rectangle(buffer, x, y, seed);
                if card.width < self.min_size || card.height < self.min_size {
                    continue;
                }

                visited.fill_rect(card.x, card.y, card.width, card.height);
                if cards.iter().any(|c| c.significant_overlap(&card, DUPLICATE_OVERLAP)) {
                    continue;
                }
                debug!("Card candidate at ({}, {}) {}x{} color {}", card.x, card.y, card.width, card.height, seed);
                cards.push(card);
            }
        }

        let mut merged = merge_until_stable(cards, MERGE_OVERLAP, MERGE_MARGIN);
        merged.sort_by(|a, b| b.area().cmp(&a.area()).then((a.y, a.x).cmp(&(b.y, b.x))));
        merged
    }
}

/// Whether the patch anchored at the seed is uniformly the seed color
///
/// A patch that would leave the image is not solid.
fn is_solid_patch(buffer: &PixelBuffer, x: u32, y: u32, seed: Color) -> bool {
    if x + PATCH_SIZE > buffer.width() || y + PATCH_SIZE > buffer.height() {
        return false;
    }
    (y..y + PATCH_SIZE).all(|py| {
        (x..x + PATCH_SIZE).all(|px| colors_similar(buffer.color(px, py), seed, PATCH_TOLERANCE))
    })
}

/// Grow a rectangle from the seed along its row and column
///
/// Each side moves outwards one pixel at a time while the next pixel on the
/// seed's row (or column) stays close to the seed color.
fn extend_rectangle(buffer: &PixelBuffer, x: u32, y: u32, seed: Color) -> BoundingBox {
    let similar = |px: u32, py: u32| colors_similar(buffer.color(px, py), seed, EXTEND_TOLERANCE);

    let mut left = x;
    while left > 0 && similar(left - 1, y) {
        left -= 1;
    }
    let mut right = x;
    while right + 1 < buffer.width() && similar(right + 1, y) {
        right += 1;
    }
    let mut top = y;
    while top > 0 && similar(x, top - 1) {
        top -= 1;
    }
    let mut bottom = y;
    while bottom + 1 < buffer.height() && similar(x, bottom + 1) {
        bottom += 1;
    }

    BoundingBox::from_extremes(left, top, right, bottom)
}

impl DetectorStrategy for CardStrategy {
    fn name(&self) -> &'static str {
        "uiCards"
    }

    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let regions: Vec<DetectedRegion> = self.detect_boxes(buffer)
            .into_iter()
            .filter(|b| b.is_valid())
            .map(|b| {
                let shape = classify_shape(CARD_PROFILE, &b);
                DetectedRegion::new(b.with_image_size(buffer.width(), buffer.height()),
                                    RegionSource::Card, CARD_CONFIDENCE)
                    .with_description(format!("UI {} ({}x{})", shape, b.width, b.height))
                    .with_shape(shape)
            })
            .collect();

        info!("Card detection found {} region(s)", regions.len());
        Ok(regions)
    }
}
