//! External vision collaborators
//!
//! Interfaces for the remote services the extraction engine can consult,
//! plus adapters that turn their answers into regions.

mod analyzer;
mod vision;

pub use analyzer::{CloudDetection, CloudDetectionKind, CloudVisionAnalyzer, cloud_detections_to_regions};
pub use vision::{RecordedCompletionProvider, VisionCompletionProvider, REGION_PROMPT, REGION_SYSTEM_PROMPT};
