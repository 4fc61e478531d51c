//! Detected and extracted region records
//!
//! A `DetectedRegion` is what a detection strategy produces: a bounding box
//! with provenance and a shape tag. An `ExtractedImage` is created from it
//! only after a successful crop and is the value handed back to callers.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;

use crate::coordinate::BoundingBox;

/// Where a region came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegionSource {
    #[serde(rename = "ai")]
    Ai,
    #[serde(rename = "objects")]
    CloudObject,
    #[serde(rename = "people")]
    CloudPerson,
    #[serde(rename = "captions")]
    CloudCaption,
    #[serde(rename = "smartCrops")]
    CloudSmartCrop,
    #[serde(rename = "card")]
    Card,
    #[serde(rename = "contour")]
    Contour,
    #[serde(rename = "edge")]
    Edge,
    #[serde(rename = "floodfill")]
    FloodFill,
    #[serde(rename = "divider")]
    Divider,
    #[serde(rename = "grid")]
    Grid,
}

impl RegionSource {
    /// Reconciliation priority, lower wins
    ///
    /// Oracle sources come first, then pixel detectors from the most to the
    /// least structured.
    pub fn priority(&self) -> u8 {
        match self {
            RegionSource::Ai => 0,
            RegionSource::CloudObject => 1,
            RegionSource::CloudPerson => 2,
            RegionSource::CloudCaption => 3,
            RegionSource::CloudSmartCrop => 4,
            RegionSource::Card => 5,
            RegionSource::Contour => 6,
            RegionSource::Edge => 7,
            RegionSource::FloodFill => 8,
            RegionSource::Divider => 9,
            RegionSource::Grid => 10,
        }
    }

    /// Oracle boxes are approximate and need boundary refinement
    pub fn is_approximate(&self) -> bool {
        matches!(self,
            RegionSource::Ai
            | RegionSource::CloudObject
            | RegionSource::CloudPerson
            | RegionSource::CloudCaption
            | RegionSource::CloudSmartCrop)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionSource::Ai => "ai",
            RegionSource::CloudObject => "objects",
            RegionSource::CloudPerson => "people",
            RegionSource::CloudCaption => "captions",
            RegionSource::CloudSmartCrop => "smartCrops",
            RegionSource::Card => "card",
            RegionSource::Contour => "contour",
            RegionSource::Edge => "edge",
            RegionSource::FloodFill => "floodfill",
            RegionSource::Divider => "divider",
            RegionSource::Grid => "grid",
        }
    }
}

impl fmt::Display for RegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate region produced by a detection strategy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedRegion {
    /// Location of the region
    #[serde(rename = "boundingBox")]
    pub bbox: BoundingBox,
    /// Strategy or collaborator that produced the region
    pub source: RegionSource,
    /// Free-text caption
    pub description: String,
    /// Shape classification tag
    pub shape: String,
    /// Confidence; oracle sources may report percentages
    pub confidence: f64,
    /// Preferred output file name, when the producer supplied one
    #[serde(rename = "suggestedFilename", skip_serializing_if = "Option::is_none")]
    pub suggested_filename: Option<String>,
}

impl DetectedRegion {
    pub fn new(bbox: BoundingBox, source: RegionSource, confidence: f64) -> Self {
        DetectedRegion {
            bbox,
            source,
            description: String::new(),
            shape: String::new(),
            confidence,
            suggested_filename: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_shape(mut self, shape: impl Into<String>) -> Self {
        self.shape = shape.into();
        self
    }

    pub fn with_suggested_filename(mut self, name: impl Into<String>) -> Self {
        self.suggested_filename = Some(name.into());
        self
    }

    /// Confidence on the [0, 1] scale
    ///
    /// Values above 1 are read as percentages.
    pub fn normalized_confidence(&self) -> f64 {
        let value = if self.confidence > 1.0 {
            self.confidence / 100.0
        } else {
            self.confidence
        };
        if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
    }
}

/// A cropped, encoded region ready to return to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedImage {
    /// The region this image was cropped from
    #[serde(flatten)]
    pub region: DetectedRegion,
    /// Lossless PNG bytes of the crop
    #[serde(skip)]
    pub png_data: Vec<u8>,
    /// Final crop width in pixels
    pub width: u32,
    /// Final crop height in pixels
    pub height: u32,
    /// File name to use when saving the crop
    pub filename: String,
    /// MIME type of `png_data`
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl ExtractedImage {
    /// Base64 encoding of the PNG payload
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png_data)
    }

    /// `data:` URL embedding the PNG payload
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_normalization() {
        let bbox = BoundingBox::new(0, 0, 10, 10);
        assert_eq!(DetectedRegion::new(bbox, RegionSource::Ai, 85.0).normalized_confidence(), 0.85);
        assert_eq!(DetectedRegion::new(bbox, RegionSource::Card, 0.4).normalized_confidence(), 0.4);
        assert_eq!(DetectedRegion::new(bbox, RegionSource::Ai, -3.0).normalized_confidence(), 0.0);
    }

    #[test]
    fn test_oracle_sources_sort_first() {
        assert!(RegionSource::Ai.priority() < RegionSource::CloudObject.priority());
        assert!(RegionSource::CloudSmartCrop.priority() < RegionSource::Card.priority());
        assert!(RegionSource::Ai.is_approximate());
        assert!(!RegionSource::Contour.is_approximate());
    }

    #[test]
    fn test_data_url() {
        let image = ExtractedImage {
            region: DetectedRegion::new(BoundingBox::new(0, 0, 4, 4), RegionSource::Grid, 1.0),
            png_data: vec![1, 2, 3],
            width: 4,
            height: 4,
            filename: "grid_01.png".to_string(),
            mime_type: "image/png".to_string(),
        };
        assert_eq!(image.to_data_url(), "data:image/png;base64,AQID");
    }
}
