//! Cloud vision analyzer adapter
//!
//! An optional collaborator that returns already boxed detections (objects,
//! captions, people, smart crops) in pixel space. This module turns them
//! into validated `DetectedRegion`s for the reconciler.

use log::debug;

use crate::coordinate::BoundingBox;
use crate::detection::{DetectedRegion, RegionSource};
use crate::errors::RegionResult;
use crate::utils::shape_utils::{classify_shape, CLOUD_PROFILE};

/// Overlap fraction above which a caption box is treated as text on an object
const TEXT_SUPPRESSION_OVERLAP: f64 = 0.8;

/// Kind of detection reported by the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudDetectionKind {
    Object,
    Caption,
    Person,
    SmartCrop,
}

impl CloudDetectionKind {
    fn source(&self) -> RegionSource {
        match self {
            CloudDetectionKind::Object => RegionSource::CloudObject,
            CloudDetectionKind::Caption => RegionSource::CloudCaption,
            CloudDetectionKind::Person => RegionSource::CloudPerson,
            CloudDetectionKind::SmartCrop => RegionSource::CloudSmartCrop,
        }
    }
}

/// One raw detection from the analyzer, in pixel units
///
/// Coordinates are signed because remote services occasionally report
/// boxes hanging off the image.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudDetection {
    pub kind: CloudDetectionKind,
    pub label: String,
    pub confidence: f64,
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// A remote service that analyzes an image in one call
pub trait CloudVisionAnalyzer: Send + Sync {
    /// Analyze an encoded image
    fn analyze(&self, image_bytes: &[u8]) -> RegionResult<Vec<CloudDetection>>;
}

/// Convert analyzer detections into regions
///
/// Boxes are clamped to the image and dropped when under 4px. Captions that
/// sit on top of an object or person are suppressed.
pub fn cloud_detections_to_regions(detections: &[CloudDetection],
                                   image_width: u32, image_height: u32) -> Vec<DetectedRegion> {
    let mut regions: Vec<DetectedRegion> = Vec::new();

    for detection in detections {
        let left = detection.x.clamp(0, image_width as i64);
        let top = detection.y.clamp(0, image_height as i64);
        let right = (detection.x + detection.width.max(0)).clamp(0, image_width as i64);
        let bottom = (detection.y + detection.height.max(0)).clamp(0, image_height as i64);

        let bbox = BoundingBox::new(left as u32, top as u32, (right - left) as u32, (bottom - top) as u32);
        if !bbox.is_valid() {
            debug!("Dropping undersized {:?} detection '{}'", detection.kind, detection.label);
            continue;
        }

        let shape = match detection.kind {
            CloudDetectionKind::Object => classify_shape(CLOUD_PROFILE, &bbox),
            CloudDetectionKind::Caption => "text".to_string(),
            CloudDetectionKind::Person => "person".to_string(),
            CloudDetectionKind::SmartCrop => "thumbnail".to_string(),
        };

        regions.push(
            DetectedRegion::new(bbox.with_image_size(image_width, image_height),
                                detection.kind.source(), detection.confidence)
                .with_description(detection.label.clone())
                .with_shape(shape)
        );
    }

    let solids: Vec<BoundingBox> = regions
        .iter()
        .filter(|r| matches!(r.source, RegionSource::CloudObject | RegionSource::CloudPerson))
        .map(|r| r.bbox)
        .collect();

    regions.retain(|r| {
        r.source != RegionSource::CloudCaption
            || !solids.iter().any(|s| s.significant_overlap(&r.bbox, TEXT_SUPPRESSION_OVERLAP))
    });

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(kind: CloudDetectionKind, x: i64, y: i64, w: i64, h: i64) -> CloudDetection {
        CloudDetection { kind, label: "thing".to_string(), confidence: 80.0, x, y, width: w, height: h }
    }

    #[test]
    fn test_boxes_are_clamped_and_validated() {
        let regions = cloud_detections_to_regions(&[
            detection(CloudDetectionKind::Object, -10, -10, 60, 60),
            detection(CloudDetectionKind::Object, 98, 98, 10, 10),
        ], 100, 100);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox.x, 0);
        assert_eq!(regions[0].bbox.width, 50);
        assert_eq!(regions[0].shape, "icon");
        assert_eq!(regions[0].source, RegionSource::CloudObject);
    }

    #[test]
    fn test_caption_on_object_is_suppressed() {
        let regions = cloud_detections_to_regions(&[
            detection(CloudDetectionKind::Object, 10, 10, 200, 100),
            detection(CloudDetectionKind::Caption, 20, 20, 50, 10),
            detection(CloudDetectionKind::Caption, 250, 150, 40, 10),
            detection(CloudDetectionKind::Person, 300, 0, 50, 120),
        ], 400, 300);
        let sources: Vec<RegionSource> = regions.iter().map(|r| r.source).collect();
        assert_eq!(sources, vec![RegionSource::CloudObject, RegionSource::CloudCaption, RegionSource::CloudPerson]);
        assert_eq!(regions[1].bbox.x, 250);
        assert_eq!(regions[2].shape, "person");
    }
}
