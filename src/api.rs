use std::fs;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::config::ExtractionConfig;
use crate::detection::{DetectionReport, ExtractedImage, ExtractionMode, RegionExtractor};
use crate::errors::{RegionError, RegionResult};
use crate::providers::{CloudVisionAnalyzer, VisionCompletionProvider};
use crate::raster::PixelBuffer;
use crate::raster::codec::sniff_mime_type;
use crate::utils::format_utils::summarize;
use crate::utils::logger::Logger;

/// One extraction call: the encoded image and how to split it
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Encoded source image (PNG, JPEG, ...)
    pub image_bytes: Vec<u8>,
    /// MIME type of `image_bytes`; sniffed from the bytes when absent
    pub mime_type: Option<String>,
    /// Extraction mode with its parameters
    pub mode: ExtractionMode,
}

impl ExtractionRequest {
    pub fn new(image_bytes: Vec<u8>, mode: ExtractionMode) -> Self {
        ExtractionRequest { image_bytes, mime_type: None, mode }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// Result of an extraction call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    /// False only when the request as a whole failed
    pub success: bool,
    /// Successfully cropped regions
    pub images: Vec<ExtractedImage>,
    /// Number of entries in `images`
    pub total_found: usize,
    /// Human readable outcome
    pub summary: String,
    /// Failure reason when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResponse {
    /// A failed response carrying the error text
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        ExtractionResponse {
            success: false,
            images: Vec::new(),
            total_found: 0,
            summary: format!("Extraction failed: {}", message),
            error: Some(message),
        }
    }

    /// Serialize the response as pretty-printed JSON
    pub fn to_json(&self) -> RegionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Main interface to the RegionKit library
pub struct RegionKit {
    config: ExtractionConfig,
    logger: Option<Logger>,
    vision: Option<Box<dyn VisionCompletionProvider>>,
    analyzer: Option<Box<dyn CloudVisionAnalyzer>>,
}

impl RegionKit {
    /// Create a new RegionKit instance without remote collaborators
    ///
    /// # Arguments
    /// * `config` - Detector and pipeline parameters
    pub fn new(config: ExtractionConfig) -> Self {
        RegionKit {
            config,
            logger: None,
            vision: None,
            analyzer: None,
        }
    }

    /// Record detected region tables to a log file
    ///
    /// # Arguments
    /// * `log_file` - Path to the log file, created or truncated
    ///
    /// # Returns
    /// The updated instance or an error if the file cannot be created
    pub fn with_log_file(mut self, log_file: &str) -> RegionResult<Self> {
        self.logger = Some(Logger::new(log_file)?);
        Ok(self)
    }

    /// Attach the vision oracle used by the AI and hybrid modes
    pub fn with_vision_provider(mut self, provider: Box<dyn VisionCompletionProvider>) -> Self {
        self.vision = Some(provider);
        self
    }

    /// Attach the cloud analyzer used by the hybrid mode
    pub fn with_cloud_analyzer(mut self, analyzer: Box<dyn CloudVisionAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn extractor(&self) -> RegionExtractor<'_> {
        RegionExtractor::new(&self.config, self.vision.as_deref(), self.analyzer.as_deref())
    }

    /// Run an extraction request
    ///
    /// Never returns an error: failures are reported through
    /// `success = false` and the `error` field.
    ///
    /// # Arguments
    /// * `request` - Image bytes and extraction mode
    ///
    /// # Returns
    /// The extraction response
    pub fn extract(&self, request: &ExtractionRequest) -> ExtractionResponse {
        let buffer = match PixelBuffer::decode(&request.image_bytes) {
            Ok(buffer) => buffer,
            Err(e) => {
                error!("Cannot decode source image: {}", e);
                return ExtractionResponse::failure(e.to_string());
            }
        };

        if request.mode.uses_oracle() && self.vision.is_none() {
            debug!("{} requested without a vision provider", request.mode);
        }

        let mime_type = request.mime_type
            .clone()
            .unwrap_or_else(|| sniff_mime_type(&request.image_bytes).to_string());

        let (report, images) = match self.extractor()
            .extract(&buffer, &request.image_bytes, &mime_type, &request.mode) {
            Ok(result) => result,
            Err(e) => {
                error!("Extraction using {} failed: {}", request.mode, e);
                return ExtractionResponse::failure(e.to_string());
            }
        };

        self.record(&request.mode, &report);

        let mut summary = summarize(request.mode.name(), report.regions.len(), images.len());
        if !report.notes.is_empty() {
            summary.push_str(&format!(" ({})", report.notes.join("; ")));
        }
        info!("{}", summary);

        ExtractionResponse {
            success: true,
            total_found: images.len(),
            images,
            summary,
            error: None,
        }
    }

    /// Read an image file and run an extraction on it
    pub fn extract_file(&self, input_path: &str, mode: ExtractionMode) -> RegionResult<ExtractionResponse> {
        let bytes = fs::read(input_path)?;
        Ok(self.extract(&ExtractionRequest::new(bytes, mode)))
    }

    /// Detect regions without cropping them
    ///
    /// # Arguments
    /// * `buffer` - The decoded source image
    /// * `image_bytes` - Encoded source, forwarded to remote collaborators
    /// * `mode` - Extraction mode
    ///
    /// # Returns
    /// The reconciled regions and any degradation notes
    pub fn detect(&self, buffer: &PixelBuffer, image_bytes: &[u8],
                  mode: &ExtractionMode) -> RegionResult<DetectionReport> {
        let mime_type = sniff_mime_type(image_bytes);
        let report = self.extractor().detect(buffer, image_bytes, mime_type, mode)?;
        self.record(mode, &report);
        Ok(report)
    }

    fn record(&self, mode: &ExtractionMode, report: &DetectionReport) {
        if let Some(logger) = &self.logger {
            if let Err(e) = logger.log_regions(&format!("Regions found using {}", mode), &report.regions) {
                warn!("Cannot write region table to log file: {}", RegionError::from(e));
            }
        }
    }
}
