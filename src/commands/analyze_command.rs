//! Image region analysis command
//!
//! This module implements the command that reports what every detector
//! sees in an image without writing any crops.

use std::fs;

use clap::ArgMatches;
use log::{debug, info};

use crate::api::RegionKit;
use crate::commands::command_traits::Command;
use crate::coordinate::estimate_background;
use crate::detection::ExtractionMode;
use crate::errors::{RegionError, RegionResult};
use crate::raster::PixelBuffer;
use crate::raster::codec::sniff_mime_type;
use crate::utils::format_utils::format_region_table;

/// Command for analyzing an image with every detector
pub struct AnalyzeCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Whether to print the full region tables
    verbose: bool,
    /// Configured extraction engine
    kit: &'a RegionKit,
}

impl<'a> AnalyzeCommand<'a> {
    /// Create a new analyze command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `kit` - Configured extraction engine
    ///
    /// # Returns
    /// A new AnalyzeCommand instance or an error
    pub fn new(args: &ArgMatches, kit: &'a RegionKit) -> RegionResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| RegionError::GenericError("Missing input file".to_string()))?
            .clone();

        let verbose = args.get_flag("verbose");

        Ok(AnalyzeCommand {
            input_file,
            verbose,
            kit,
        })
    }

    /// Modes compared by the analysis, local detectors first
    fn analysis_modes(&self) -> RegionResult<Vec<ExtractionMode>> {
        ["sections", "contour", "floodfill", "uiCards", "components", "aiRegions", "hybrid"]
            .iter()
            .map(|name| ExtractionMode::from_name(name, self.kit.config()))
            .collect()
    }

    /// Display basic image information
    fn display_image_summary(&self, buffer: &PixelBuffer, bytes: &[u8]) {
        println!("Image Analysis Results:");
        println!("  File: {}", self.input_file);
        println!("  Format: {}", sniff_mime_type(bytes));
        println!("  Dimensions: {}x{}", buffer.width(), buffer.height());
        println!("  Estimated background: {}", estimate_background(buffer));
    }
}

impl<'a> Command for AnalyzeCommand<'a> {
    fn execute(&self) -> RegionResult<()> {
        info!("Analyzing {}", self.input_file);

        let bytes = fs::read(&self.input_file)?;
        let buffer = PixelBuffer::decode(&bytes)?;
        self.display_image_summary(&buffer, &bytes);

        for mode in self.analysis_modes()? {
            let report = match self.kit.detect(&buffer, &bytes, &mode) {
                Ok(report) => report,
                Err(e) => {
                    println!("\n{}: failed ({})", mode, e);
                    continue;
                }
            };

            println!("\n{}: {} region(s)", mode, report.regions.len());
            for note in &report.notes {
                println!("  note: {}", note);
            }
            if self.verbose && !report.regions.is_empty() {
                print!("{}", format_region_table(&report.regions));
            }
            debug!("{} analysis finished with {} region(s)", mode, report.regions.len());
        }

        Ok(())
    }
}
