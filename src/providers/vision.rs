//! Vision completion provider
//!
//! The AI oracle strategy asks a remote multimodal model to describe the
//! regions of an image. The transport lives outside this crate; anything
//! that can answer a prompt about an image implements
//! `VisionCompletionProvider`.

use std::fs;

use log::info;

use crate::errors::{RegionError, RegionResult};

/// Prompt asking the model for region descriptions
pub const REGION_PROMPT: &str = "Identify every distinct visual element in this image \
(icons, logos, cards, sections, photos, charts, buttons). Respond with a JSON array only. \
Each element must be an object with the fields: \"description\" (string), \"imageType\" \
(string), \"boundingBox\" (object with \"normalizedX\", \"normalizedY\", \"normalizedWidth\", \
\"normalizedHeight\", all between 0 and 1 relative to the image size), \"confidence\" \
(number between 0 and 1) and \"suggestedFilename\" (string without extension).";

/// System prompt sent alongside `REGION_PROMPT`
pub const REGION_SYSTEM_PROMPT: &str = "You are a precise UI and graphics analyst. \
You locate visual elements and report tight bounding boxes as strict JSON.";

/// A remote model that answers a text prompt about an image
pub trait VisionCompletionProvider: Send + Sync {
    /// Ask the model about an image
    ///
    /// # Arguments
    /// * `image_bytes` - Encoded source image
    /// * `mime_type` - MIME type of `image_bytes`
    /// * `prompt` - User prompt
    /// * `system_prompt` - Optional system instructions
    ///
    /// # Returns
    /// The model's free-text answer, or `ProviderError` on timeout, auth or
    /// quota failures
    fn complete(&self, image_bytes: &[u8], mime_type: &str,
                prompt: &str, system_prompt: Option<&str>) -> RegionResult<String>;
}

/// Provider that replays a previously recorded answer
///
/// Useful for offline runs and for re-running extraction against a saved
/// model response.
#[derive(Debug, Clone)]
pub struct RecordedCompletionProvider {
    response: String,
}

impl RecordedCompletionProvider {
    pub fn new(response: impl Into<String>) -> Self {
        RecordedCompletionProvider { response: response.into() }
    }

    /// Load the recorded answer from a text file
    pub fn from_file(path: &str) -> RegionResult<Self> {
        let response = fs::read_to_string(path)
            .map_err(|e| RegionError::ProviderError(format!("Cannot read recorded response {}: {}", path, e)))?;
        info!("Loaded recorded oracle response from {} ({} bytes)", path, response.len());
        Ok(RecordedCompletionProvider { response })
    }
}

impl VisionCompletionProvider for RecordedCompletionProvider {
    fn complete(&self, _image_bytes: &[u8], _mime_type: &str,
                _prompt: &str, _system_prompt: Option<&str>) -> RegionResult<String> {
        Ok(self.response.clone())
    }
}
