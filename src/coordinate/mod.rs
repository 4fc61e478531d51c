//! Color and rectangle primitives
//!
//! This module provides the color metrics, bounding box algebra and the
//! dense pixel mask shared by every detection strategy.

mod bbox;
mod color;
mod mask;

// Re-export key types
pub use self::bbox::{BoundingBox, MIN_REGION_SIZE};
pub use self::color::{Color, colors_similar, color_distance, estimate_background};
pub use self::mask::PixelMask;
