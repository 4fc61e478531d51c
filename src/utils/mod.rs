//! Utility modules for common functionality
//!
//! This module provides the pipeline helpers shared by the detectors and the
//! front-ends: merging, refinement, shape classification, cropping, naming
//! and logging.

pub mod logger;
mod progress;
pub mod merge_utils;
pub mod refine_utils;
pub mod shape_utils;
pub mod crop_utils;
pub(crate) mod format_utils;
pub(crate) mod string_utils;

pub use progress::ProgressTracker;
