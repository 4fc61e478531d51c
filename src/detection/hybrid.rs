//! Hybrid fusion
//!
//! Runs the oracle, the cloud analyzer and the local pixel detectors over
//! one image and pools their candidates for the reconciler. The remote
//! calls run on scoped threads while the pixel detectors run on the
//! calling thread; nothing is shared but read-only borrows.

use std::thread;

use log::{info, warn};

use crate::config::ExtractionConfig;
use crate::providers::{CloudVisionAnalyzer, VisionCompletionProvider, cloud_detections_to_regions};
use crate::raster::PixelBuffer;

use super::ai_strategy::AiRegionStrategy;
use super::card_strategy::CardStrategy;
use super::contour_strategy::ContourStrategy;
use super::detector_strategy::DetectorStrategy;
use super::edge_strategy::EdgeStrategy;
use super::region::DetectedRegion;

/// Candidates pooled from every hybrid source, plus notes for the summary
#[derive(Debug, Default)]
pub struct HybridCandidates {
    pub regions: Vec<DetectedRegion>,
    pub notes: Vec<String>,
}

/// Run the local detectors in merge priority order (cards, contour, edges)
fn detect_local(buffer: &PixelBuffer, config: &ExtractionConfig) -> Vec<DetectedRegion> {
    let detectors: Vec<Box<dyn DetectorStrategy>> = vec![
        Box::new(CardStrategy::new(config.card_min_size)),
        Box::new(ContourStrategy::new(config.contour_min_size, config.contour_color_threshold)),
        Box::new(EdgeStrategy::new(config.edge_min_size, config.edge_threshold)),
    ];

    let mut regions = Vec::new();
    for detector in detectors {
        match detector.detect(buffer) {
            Ok(found) => regions.extend(found),
            Err(e) => warn!("{} detector failed in hybrid mode: {}", detector.name(), e),
        }
    }
    regions
}

/// Collect candidates from every available source
///
/// # Arguments
/// * `buffer` - The decoded source image
/// * `image_bytes` - Encoded source, forwarded to the remote services
/// * `mime_type` - MIME type of `image_bytes`
/// * `config` - Detector parameters
/// * `vision` - Vision oracle, when configured
/// * `analyzer` - Cloud analyzer, when configured
///
/// # Returns
/// Unreconciled candidates. A missing or failing remote source only adds a
/// note; the pixel detectors always contribute.
pub fn collect_hybrid_candidates(buffer: &PixelBuffer, image_bytes: &[u8], mime_type: &str,
                                 config: &ExtractionConfig,
                                 vision: Option<&dyn VisionCompletionProvider>,
                                 analyzer: Option<&dyn CloudVisionAnalyzer>) -> HybridCandidates {
    let width = buffer.width();
    let height = buffer.height();
    let mut candidates = HybridCandidates::default();

    let (oracle, cloud, local) = thread::scope(|scope| {
        let oracle = vision.map(|provider| scope.spawn(move || {
            AiRegionStrategy::new(provider, image_bytes, mime_type).detect(buffer)
        }));
        let cloud = analyzer.map(|service| scope.spawn(move || {
            service.analyze(image_bytes).map(|found| cloud_detections_to_regions(&found, width, height))
        }));

        let local = detect_local(buffer, config);
        (oracle.map(|h| h.join()), cloud.map(|h| h.join()), local)
    });

    match oracle {
        None => candidates.notes.push("AI oracle not configured".to_string()),
        Some(Ok(Ok(regions))) => candidates.regions.extend(regions),
        Some(Ok(Err(e))) => {
            warn!("AI oracle unavailable: {}", e);
            candidates.notes.push(format!("AI oracle unavailable: {}", e));
        }
        Some(Err(_)) => {
            warn!("AI oracle worker panicked");
            candidates.notes.push("AI oracle unavailable".to_string());
        }
    }

    match cloud {
        None => {}
        Some(Ok(Ok(regions))) => candidates.regions.extend(regions),
        Some(Ok(Err(e))) => {
            warn!("Cloud analyzer unavailable: {}", e);
            candidates.notes.push(format!("cloud analyzer unavailable: {}", e));
        }
        Some(Err(_)) => {
            warn!("Cloud analyzer worker panicked");
            candidates.notes.push("cloud analyzer unavailable".to_string());
        }
    }

    candidates.regions.extend(local);
    info!("Hybrid fusion collected {} candidate(s)", candidates.regions.len());
    candidates
}
