//! Horizontal section divider detection
//!
//! Splits a page-like image into full-width bands. Rows whose sampled colors
//! are all alike are "uniform"; runs of uniform rows between content, or
//! sharp changes of uniform color, mark the dividers between sections.

use log::{debug, info};

use crate::coordinate::{BoundingBox, Color, color_distance};
use crate::errors::RegionResult;
use crate::raster::PixelBuffer;

use super::detector_strategy::DetectorStrategy;
use super::region::{DetectedRegion, RegionSource};

/// Confidence reported for section regions
const SECTION_CONFIDENCE: f64 = 0.8;

/// Columns sampled per row
const ROW_SAMPLES: u32 = 20;

/// Max distance from the first sample for a row to count as uniform
const UNIFORM_DISTANCE: f64 = 20.0;

/// Distance between uniform colors that counts as a color shift
const SHIFT_DISTANCE: f64 = 30.0;

/// Non-uniform rows needed before a uniform run counts as a gap
const MIN_CONTENT_RUN: u32 = 5;

/// Rows a uniform run must span before a color shift after it counts
const MIN_SHIFT_RUN: u32 = 2;

/// Minimum section height, also the margin for implicit edge dividers
const MIN_SECTION_HEIGHT: u32 = 20;

/// Full-width section splitter
#[derive(Debug, Clone, Default)]
pub struct SectionStrategy;

/// A run of consecutive uniform rows
#[derive(Debug, Clone, Copy)]
struct UniformRun {
    start: u32,
    end: u32,
    color: Color,
    /// Whether the run opened right after a long block of content
    after_content: bool,
}

impl UniformRun {
    /// Record the gap divider of a finished run, if it has one
    fn close(&self, dividers: &mut Vec<u32>) {
        if self.after_content {
            dividers.push(self.start + (self.end - self.start) / 2);
        }
    }
}

impl SectionStrategy {
    pub fn new() -> Self {
        SectionStrategy
    }

    /// The color of a uniform row, or `None` when the row has content
    fn row_uniform_color(buffer: &PixelBuffer, y: u32) -> Option<Color> {
        let max_x = buffer.width() - 1;
        let first = buffer.color(0, y);
        for i in 1..ROW_SAMPLES {
            let x = (i as u64 * max_x as u64 / (ROW_SAMPLES - 1) as u64) as u32;
            if color_distance(buffer.color(x, y), first) >= UNIFORM_DISTANCE {
                return None;
            }
        }
        Some(first)
    }

    /// Divider rows, sorted and deduplicated
    ///
    /// A uniform run that opens after more than 5 content rows yields a
    /// divider at its midpoint. A uniform color shift yields a divider at
    /// the first row of the new color, provided the previous run spans
    /// more than 2 rows.
    pub fn find_dividers(&self, buffer: &PixelBuffer) -> Vec<u32> {
        let mut dividers = Vec::new();
        if buffer.width() == 0 {
            return dividers;
        }

        let mut current: Option<UniformRun> = None;
        let mut content_rows = 0u32;

        for y in 0..buffer.height() {
            match Self::row_uniform_color(buffer, y) {
                Some(color) => {
                    match current {
                        Some(mut run) if color_distance(color, run.color) <= SHIFT_DISTANCE => {
                            run.end = y;
                            current = Some(run);
                        }
                        Some(run) => {
                            // Uniform color changed without content in between
                            if run.end - run.start + 1 > MIN_SHIFT_RUN {
                                dividers.push(y);
                            }
                            run.close(&mut dividers);
                            current = Some(UniformRun { start: y, end: y, color, after_content: false });
                        }
                        None => {
                            let after_content = content_rows > MIN_CONTENT_RUN;
                            current = Some(UniformRun { start: y, end: y, color, after_content });
                        }
                    }
                    content_rows = 0;
                }
                None => {
                    if let Some(run) = current.take() {
                        run.close(&mut dividers);
                    }
                    content_rows += 1;
                }
            }
        }

        if let Some(run) = current.take() {
            run.close(&mut dividers);
        }

        dividers.sort_unstable();
        dividers.dedup();
        debug!("Section dividers at rows {:?}", dividers);
        dividers
    }

    /// Full-width section boxes between consecutive dividers
    ///
    /// Falls back to a single box covering the whole image.
    pub fn section_boxes(&self, buffer: &PixelBuffer) -> Vec<BoundingBox> {
        let width = buffer.width();
        let height = buffer.height();
        let mut dividers = self.find_dividers(buffer);

        if let Some(&first) = dividers.first() {
            if first > MIN_SECTION_HEIGHT {
                dividers.insert(0, 0);
            }
        }
        if let Some(&last) = dividers.last() {
            if height.saturating_sub(last) > MIN_SECTION_HEIGHT {
                dividers.push(height);
            }
        }

        let mut sections: Vec<BoundingBox> = dividers
            .windows(2)
            .filter(|pair| pair[1] - pair[0] > MIN_SECTION_HEIGHT)
            .map(|pair| BoundingBox::new(0, pair[0], width, pair[1] - pair[0]))
            .collect();

        if sections.is_empty() {
            sections.push(BoundingBox::new(0, 0, width, height));
        }
        sections
    }
}

impl DetectorStrategy for SectionStrategy {
    fn name(&self) -> &'static str {
        "sections"
    }

    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>> {
        let regions: Vec<DetectedRegion> = self.section_boxes(buffer)
            .into_iter()
            .filter(|b| b.is_valid())
            .enumerate()
            .map(|(i, b)| {
                DetectedRegion::new(b.with_image_size(buffer.width(), buffer.height()),
                                    RegionSource::Divider, SECTION_CONFIDENCE)
                    .with_description(format!("Section {} (rows {}-{})", i + 1, b.y, b.bottom()))
                    .with_shape("section")
            })
            .collect();

        info!("Section detection found {} section(s)", regions.len());
        Ok(regions)
    }
}
