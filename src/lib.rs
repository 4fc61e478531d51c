pub mod errors;
pub mod config;
pub mod coordinate;
pub mod raster;
pub mod detection;
pub mod providers;
pub mod utils;
pub mod commands;
pub mod api;

pub use crate::api::{ExtractionRequest, ExtractionResponse, RegionKit};
pub use crate::config::ExtractionConfig;
pub use crate::errors::{RegionError, RegionResult};

pub use coordinate::{BoundingBox, Color};
pub use detection::{DetectedRegion, ExtractedImage, ExtractionMode, RegionSource};
pub use raster::PixelBuffer;
