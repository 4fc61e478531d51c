//! Region detection
//!
//! This module provides the detection strategies, the oracle parser and
//! the orchestrator that runs a mode from decoded pixels to cropped regions.

mod region;
mod detector_strategy;
mod contour_strategy;
mod floodfill_strategy;
mod card_strategy;
mod edge_strategy;
mod section_strategy;
mod grid_strategy;
mod ai_strategy;
mod hybrid;

#[cfg(test)]
mod tests;

// Public exports
pub use region::{DetectedRegion, ExtractedImage, RegionSource};
pub use detector_strategy::{DetectorStrategy, DetectorStrategyFactory, ExtractionMode};
pub use contour_strategy::ContourStrategy;
pub use floodfill_strategy::FloodFillStrategy;
pub use card_strategy::CardStrategy;
pub use edge_strategy::EdgeStrategy;
pub use section_strategy::SectionStrategy;
pub use grid_strategy::{GridStrategy, split_grid};
pub use ai_strategy::{AiRegionStrategy, parse_oracle_regions};
pub use hybrid::{HybridCandidates, collect_hybrid_candidates};

// Facade running a mode end to end
pub use detector_strategy::{DetectionReport, RegionExtractor};
