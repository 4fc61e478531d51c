//! Region detector strategy definitions
//!
//! This module defines the strategy pattern for the detection algorithms,
//! the extraction modes callers can pick from, and the factory mapping one
//! to the other.

use std::fmt;

use log::{debug, info, warn};

use crate::config::ExtractionConfig;
use crate::errors::{RegionError, RegionResult};
use crate::providers::{CloudVisionAnalyzer, VisionCompletionProvider};
use crate::raster::PixelBuffer;
use crate::utils::crop_utils::crop_regions;
use crate::utils::merge_utils::reconcile;
use crate::utils::refine_utils::refine_bounds;

use super::ai_strategy::AiRegionStrategy;
use super::card_strategy::CardStrategy;
use super::contour_strategy::ContourStrategy;
use super::edge_strategy::EdgeStrategy;
use super::floodfill_strategy::FloodFillStrategy;
use super::grid_strategy::GridStrategy;
use super::hybrid::collect_hybrid_candidates;
use super::region::{DetectedRegion, ExtractedImage, RegionSource};
use super::section_strategy::SectionStrategy;

/// A single region detection algorithm
///
/// Implementations are pure with respect to the pixel buffer: the same
/// buffer and parameters always yield the same regions.
pub trait DetectorStrategy {
    /// Short name used in logs and summaries
    fn name(&self) -> &'static str;

    /// Detect candidate regions in a decoded image
    ///
    /// # Arguments
    /// * `buffer` - The decoded source image
    ///
    /// # Returns
    /// Candidate regions in pixel space with normalized coordinates filled in
    fn detect(&self, buffer: &PixelBuffer) -> RegionResult<Vec<DetectedRegion>>;
}

/// Extraction mode selected by the caller
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionMode {
    /// Equal cells, `rows x columns`
    Grid { rows: u32, columns: u32 },
    /// Full-width bands between dividers
    Sections,
    /// Sobel edge components
    Components { min_size: u32 },
    /// Foreground components against the estimated background
    Contour { min_size: u32, color_threshold: u8 },
    /// Uniform color blobs
    FloodFill { min_size: u32, tolerance: u8 },
    /// Solid rectangular UI cards
    UiCards { min_size: u32 },
    /// Regions proposed by the vision oracle
    AiRegions,
    /// Oracle, cloud analyzer and pixel detectors fused together
    Hybrid,
}

impl ExtractionMode {
    /// Every mode name accepted by `from_name`
    pub const NAMES: [&'static str; 8] =
        ["grid", "sections", "components", "contour", "floodfill", "uiCards", "aiRegions", "hybrid"];

    /// Build a mode from its name, taking parameters from the configuration
    ///
    /// Names are matched case-insensitively.
    pub fn from_name(name: &str, config: &ExtractionConfig) -> RegionResult<Self> {
        let mode = match name.to_ascii_lowercase().as_str() {
            "grid" => ExtractionMode::Grid { rows: config.grid_rows, columns: config.grid_columns },
            "sections" => ExtractionMode::Sections,
            "components" | "edges" => ExtractionMode::Components { min_size: config.edge_min_size },
            "contour" => ExtractionMode::Contour {
                min_size: config.contour_min_size,
                color_threshold: config.contour_color_threshold,
            },
            "floodfill" => ExtractionMode::FloodFill {
                min_size: config.floodfill_min_size,
                tolerance: config.floodfill_tolerance,
            },
            "uicards" | "cards" => ExtractionMode::UiCards { min_size: config.card_min_size },
            "airegions" | "ai" => ExtractionMode::AiRegions,
            "hybrid" => ExtractionMode::Hybrid,
            other => {
                return Err(RegionError::InvalidParameter(format!(
                    "Unknown extraction mode '{}', expected one of: {}",
                    other, Self::NAMES.join(", "))));
            }
        };
        Ok(mode)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExtractionMode::Grid { .. } => "grid",
            ExtractionMode::Sections => "sections",
            ExtractionMode::Components { .. } => "components",
            ExtractionMode::Contour { .. } => "contour",
            ExtractionMode::FloodFill { .. } => "floodfill",
            ExtractionMode::UiCards { .. } => "uiCards",
            ExtractionMode::AiRegions => "aiRegions",
            ExtractionMode::Hybrid => "hybrid",
        }
    }

    /// Whether the mode consults the vision oracle
    pub fn uses_oracle(&self) -> bool {
        matches!(self, ExtractionMode::AiRegions | ExtractionMode::Hybrid)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Factory for creating detector strategies
///
/// Single-strategy modes map to one detector. Hybrid is not a single
/// detector and is rejected here.
pub struct DetectorStrategyFactory<'a> {
    /// Tuning parameters not carried by the mode itself
    config: &'a ExtractionConfig,
    /// Oracle used by the AI strategy, when configured
    vision: Option<&'a dyn VisionCompletionProvider>,
}

impl<'a> DetectorStrategyFactory<'a> {
    pub fn new(config: &'a ExtractionConfig, vision: Option<&'a dyn VisionCompletionProvider>) -> Self {
        DetectorStrategyFactory { config, vision }
    }

    /// Create the strategy for a mode
    ///
    /// # Arguments
    /// * `mode` - The requested extraction mode
    /// * `image_bytes` - Encoded source, forwarded to the oracle
    /// * `mime_type` - MIME type of `image_bytes`
    ///
    /// # Returns
    /// A boxed strategy, or an error for hybrid mode or a missing oracle
    pub fn create_strategy<'b>(&self, mode: &ExtractionMode, image_bytes: &'b [u8],
                               mime_type: &'b str) -> RegionResult<Box<dyn DetectorStrategy + 'b>>
    where
        'a: 'b,
    {
        debug!("Creating detector for mode {}", mode);

        let strategy: Box<dyn DetectorStrategy + 'b> = match mode {
            ExtractionMode::Grid { rows, columns } => Box::new(GridStrategy::new(*rows, *columns)),
            ExtractionMode::Sections => Box::new(SectionStrategy::new()),
            ExtractionMode::Components { min_size } =>
                Box::new(EdgeStrategy::new(*min_size, self.config.edge_threshold)),
            ExtractionMode::Contour { min_size, color_threshold } =>
                Box::new(ContourStrategy::new(*min_size, *color_threshold)),
            ExtractionMode::FloodFill { min_size, tolerance } =>
                Box::new(FloodFillStrategy::new(*min_size, *tolerance, self.config.floodfill_max_pixels)),
            ExtractionMode::UiCards { min_size } => Box::new(CardStrategy::new(*min_size)),
            ExtractionMode::AiRegions => match self.vision {
                Some(provider) => Box::new(AiRegionStrategy::new(provider, image_bytes, mime_type)),
                None => return Err(RegionError::ProviderError("no vision provider configured".to_string())),
            },
            ExtractionMode::Hybrid => {
                return Err(RegionError::InvalidParameter(
                    "hybrid mode combines several detectors and has no single strategy".to_string()));
            }
        };

        info!("Using {} detector", strategy.name());
        Ok(strategy)
    }
}

/// Regions found for one request, before cropping
#[derive(Debug)]
pub struct DetectionReport {
    /// Reconciled regions in output order
    pub regions: Vec<DetectedRegion>,
    /// Degradations worth surfacing in the summary (oracle down, ...)
    pub notes: Vec<String>,
}

/// Main extractor that runs a mode end to end
///
/// This facade selects the strategy (or the hybrid fusion), refines
/// approximate boxes, reconciles overlaps and crops the survivors.
pub struct RegionExtractor<'a> {
    config: &'a ExtractionConfig,
    vision: Option<&'a dyn VisionCompletionProvider>,
    analyzer: Option<&'a dyn CloudVisionAnalyzer>,
    factory: DetectorStrategyFactory<'a>,
}

impl<'a> RegionExtractor<'a> {
    /// Create a new region extractor
    ///
    /// # Arguments
    /// * `config` - Detector and pipeline parameters
    /// * `vision` - Vision oracle, when configured
    /// * `analyzer` - Cloud analyzer, when configured
    pub fn new(config: &'a ExtractionConfig,
               vision: Option<&'a dyn VisionCompletionProvider>,
               analyzer: Option<&'a dyn CloudVisionAnalyzer>) -> Self {
        RegionExtractor {
            config,
            vision,
            analyzer,
            factory: DetectorStrategyFactory::new(config, vision),
        }
    }

    /// Detect, refine and reconcile regions for a mode
    ///
    /// # Arguments
    /// * `buffer` - The decoded source image
    /// * `image_bytes` - Encoded source, forwarded to remote collaborators
    /// * `mime_type` - MIME type of `image_bytes`
    /// * `mode` - The requested extraction mode
    ///
    /// # Returns
    /// The report, or an error for invalid mode parameters. An unavailable
    /// oracle is not an error: it yields zero oracle regions and a note.
    pub fn detect(&self, buffer: &PixelBuffer, image_bytes: &[u8], mime_type: &str,
                  mode: &ExtractionMode) -> RegionResult<DetectionReport> {
        info!("Detecting regions in {}x{} image using {}", buffer.width(), buffer.height(), mode);

        let mut notes = Vec::new();
        let candidates = match mode {
            ExtractionMode::Hybrid => {
                let pooled = collect_hybrid_candidates(buffer, image_bytes, mime_type,
                                                       self.config, self.vision, self.analyzer);
                notes.extend(pooled.notes);
                pooled.regions
            }
            _ => match self.factory.create_strategy(mode, image_bytes, mime_type) {
                Ok(strategy) => match strategy.detect(buffer) {
                    Ok(regions) => regions,
                    Err(RegionError::ProviderError(msg)) => {
                        warn!("AI oracle unavailable: {}", msg);
                        notes.push(format!("AI oracle unavailable: {}", msg));
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                },
                Err(RegionError::ProviderError(msg)) => {
                    warn!("AI oracle unavailable: {}", msg);
                    notes.push(format!("AI oracle unavailable: {}", msg));
                    Vec::new()
                }
                Err(e) => return Err(e),
            },
        };

        let refined = self.refine(buffer, candidates);
        let regions = match mode {
            ExtractionMode::Grid { .. } | ExtractionMode::Sections => refined,
            _ => reconcile(refined, self.config.reconcile_threshold),
        };

        debug!("{} region(s) after reconciliation", regions.len());
        Ok(DetectionReport { regions, notes })
    }

    /// Detect regions and crop each one
    ///
    /// # Returns
    /// The report and the successfully cropped images; crops that fail are
    /// logged and skipped
    pub fn extract(&self, buffer: &PixelBuffer, image_bytes: &[u8], mime_type: &str,
                   mode: &ExtractionMode) -> RegionResult<(DetectionReport, Vec<ExtractedImage>)> {
        let report = self.detect(buffer, image_bytes, mime_type, mode)?;
        let images = crop_regions(buffer, &report.regions, |r| self.padding_for(r));
        info!("Cropped {} of {} region(s)", images.len(), report.regions.len());
        Ok((report, images))
    }

    /// Crop padding for a region: cards get extra room for their borders
    pub fn padding_for(&self, region: &DetectedRegion) -> u32 {
        match region.source {
            RegionSource::Card => self.config.card_padding,
            _ => self.config.crop_padding,
        }
    }

    /// Snap approximate oracle boxes onto the real pixel edges
    ///
    /// Boxes that collapse under the minimum size are dropped.
    fn refine(&self, buffer: &PixelBuffer, regions: Vec<DetectedRegion>) -> Vec<DetectedRegion> {
        if !self.config.refine_ai_regions {
            return regions;
        }

        let (width, height) = (buffer.width(), buffer.height());
        regions
            .into_iter()
            .filter_map(|mut region| {
                if !region.source.is_approximate() {
                    return Some(region);
                }
                let refined = refine_bounds(buffer, &region.bbox, self.config.refine_threshold);
                if !refined.is_valid() {
                    debug!("Dropping {} region that refined to {}x{}",
                           region.source, refined.width, refined.height);
                    return None;
                }
                region.bbox = refined.with_image_size(width, height);
                Some(region)
            })
            .collect()
    }
}
