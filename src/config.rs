//! Extraction configuration
//!
//! Every tunable threshold of the detectors, with defaults matching the
//! documented behaviour. A TOML file can override any subset:
//!
//! ```toml
//! [contour]
//! min_size = 24
//! color_threshold = 30
//!
//! [reconcile]
//! threshold = 0.5
//! ```

use std::fs;

use log::debug;

use crate::errors::{RegionError, RegionResult};
use crate::utils::refine_utils::DEFAULT_EDGE_THRESHOLD;

/// Tunables for all detection strategies and the pipeline around them
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub contour_min_size: u32,
    pub contour_color_threshold: u8,
    pub floodfill_min_size: u32,
    pub floodfill_tolerance: u8,
    pub floodfill_max_pixels: usize,
    pub card_min_size: u32,
    pub card_padding: u32,
    pub edge_min_size: u32,
    pub edge_threshold: f64,
    pub refine_threshold: f64,
    pub refine_ai_regions: bool,
    pub crop_padding: u32,
    pub reconcile_threshold: f64,
    pub grid_rows: u32,
    pub grid_columns: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            contour_min_size: 20,
            contour_color_threshold: 25,
            floodfill_min_size: 30,
            floodfill_tolerance: 15,
            floodfill_max_pixels: 50_000,
            card_min_size: 40,
            card_padding: 6,
            edge_min_size: 20,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            refine_threshold: DEFAULT_EDGE_THRESHOLD,
            refine_ai_regions: true,
            crop_padding: 2,
            reconcile_threshold: 0.5,
            grid_rows: 2,
            grid_columns: 2,
        }
    }
}

impl ExtractionConfig {
    /// Parse a configuration from a TOML string
    ///
    /// Missing sections and keys keep their defaults; keys of the wrong type
    /// are rejected.
    pub fn from_str(content: &str) -> RegionResult<Self> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| RegionError::ConfigError(format!("Failed to parse TOML: {}", e)))?;

        let mut config = ExtractionConfig::default();
        let reader = SectionReader { table: &table };

        reader.read_u32("contour", "min_size", &mut config.contour_min_size)?;
        reader.read_u8("contour", "color_threshold", &mut config.contour_color_threshold)?;
        reader.read_u32("floodfill", "min_size", &mut config.floodfill_min_size)?;
        reader.read_u8("floodfill", "tolerance", &mut config.floodfill_tolerance)?;
        let mut max_pixels = config.floodfill_max_pixels as u32;
        reader.read_u32("floodfill", "max_pixels", &mut max_pixels)?;
        config.floodfill_max_pixels = max_pixels as usize;
        reader.read_u32("cards", "min_size", &mut config.card_min_size)?;
        reader.read_u32("cards", "padding", &mut config.card_padding)?;
        reader.read_u32("edges", "min_size", &mut config.edge_min_size)?;
        reader.read_f64("edges", "threshold", &mut config.edge_threshold)?;
        reader.read_f64("refine", "threshold", &mut config.refine_threshold)?;
        reader.read_bool("refine", "ai_regions", &mut config.refine_ai_regions)?;
        reader.read_u32("crop", "padding", &mut config.crop_padding)?;
        reader.read_f64("reconcile", "threshold", &mut config.reconcile_threshold)?;
        reader.read_u32("grid", "rows", &mut config.grid_rows)?;
        reader.read_u32("grid", "columns", &mut config.grid_columns)?;

        debug!("Loaded extraction config: {:?}", config);
        Ok(config)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: &str) -> RegionResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }
}

/// Typed access to `[section] key = value` entries
struct SectionReader<'a> {
    table: &'a toml::Table,
}

impl<'a> SectionReader<'a> {
    fn value(&self, section: &str, key: &str) -> Option<&'a toml::Value> {
        self.table.get(section).and_then(|s| s.get(key))
    }

    fn type_error(section: &str, key: &str, expected: &str) -> RegionError {
        RegionError::ConfigError(format!("[{}] {} must be {}", section, key, expected))
    }

    fn read_u32(&self, section: &str, key: &str, target: &mut u32) -> RegionResult<()> {
        if let Some(value) = self.value(section, key) {
            *target = value.as_integer()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| Self::type_error(section, key, "a non-negative integer"))?;
        }
        Ok(())
    }

    fn read_u8(&self, section: &str, key: &str, target: &mut u8) -> RegionResult<()> {
        if let Some(value) = self.value(section, key) {
            *target = value.as_integer()
                .and_then(|v| u8::try_from(v).ok())
                .ok_or_else(|| Self::type_error(section, key, "an integer between 0 and 255"))?;
        }
        Ok(())
    }

    fn read_f64(&self, section: &str, key: &str, target: &mut f64) -> RegionResult<()> {
        if let Some(value) = self.value(section, key) {
            *target = value.as_float()
                .or_else(|| value.as_integer().map(|i| i as f64))
                .ok_or_else(|| Self::type_error(section, key, "a number"))?;
        }
        Ok(())
    }

    fn read_bool(&self, section: &str, key: &str, target: &mut bool) -> RegionResult<()> {
        if let Some(value) = self.value(section, key) {
            *target = value.as_bool()
                .ok_or_else(|| Self::type_error(section, key, "a boolean"))?;
        }
        Ok(())
    }
}
