//! Region extraction command
//!
//! This module implements the command that detects regions in an image and
//! writes every crop as a PNG next to a JSON manifest.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use clap::ArgMatches;
use log::{debug, info, warn};

use crate::api::{ExtractionRequest, ExtractionResponse, RegionKit};
use crate::commands::command_traits::Command;
use crate::detection::{ExtractedImage, ExtractionMode};
use crate::errors::{RegionError, RegionResult};
use crate::utils::ProgressTracker;

use super::mode_from_args;

/// Name of the manifest written next to the crops
pub const MANIFEST_FILE: &str = "manifest.json";

/// Command for extracting regions into an output directory
pub struct ExtractCommand<'a> {
    /// Path to the input image
    input_file: String,
    /// Directory receiving the crops and the manifest
    output_dir: String,
    /// Extraction mode with its parameters
    mode: ExtractionMode,
    /// Configured extraction engine
    kit: &'a RegionKit,
}

impl<'a> ExtractCommand<'a> {
    /// Create a new extract command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `kit` - Configured extraction engine
    ///
    /// # Returns
    /// A new ExtractCommand instance or an error
    pub fn new(args: &ArgMatches, kit: &'a RegionKit) -> RegionResult<Self> {
        info!("Creating new extract command from arguments");

        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| RegionError::GenericError("Missing input file".to_string()))?
            .clone();
        info!("Input file: {}", input_file);

        let output_dir = args.get_one::<String>("output")
            .cloned()
            .unwrap_or_else(|| "regions".to_string());
        info!("Output directory: {}", output_dir);

        let mode = mode_from_args(args, kit.config())?;

        Ok(ExtractCommand {
            input_file,
            output_dir,
            mode,
            kit,
        })
    }
}

/// Pick a file name for a crop that no earlier crop has taken
fn unique_name(image: &ExtractedImage, taken: &mut HashSet<String>) -> String {
    let mut name = image.filename.clone();
    if !taken.insert(name.clone()) {
        let stem = name.trim_end_matches(".png").to_string();
        let mut n = 2;
        loop {
            name = format!("{}_{}.png", stem, n);
            if taken.insert(name.clone()) {
                break;
            }
            n += 1;
        }
        debug!("Renamed duplicate crop {} to {}", image.filename, name);
    }
    name
}

/// Write every crop into `dir`
///
/// A crop that cannot be written is warned about and left out.
///
/// # Returns
/// The crops that landed on disk, carrying the file names they were saved under
pub fn write_crops(dir: &Path, images: &[ExtractedImage]) -> RegionResult<Vec<ExtractedImage>> {
    fs::create_dir_all(dir)?;

    let progress = ProgressTracker::new(images.len() as u64, "Writing regions");
    let mut taken = HashSet::new();
    let mut written = Vec::with_capacity(images.len());
    for image in images {
        let name = unique_name(image, &mut taken);
        let path = dir.join(&name);
        progress.set_message(&name);
        match fs::write(&path, &image.png_data) {
            Ok(()) => written.push(ExtractedImage { filename: name, ..image.clone() }),
            Err(e) => warn!("Cannot write {}: {}", path.display(), e),
        }
        progress.increment(1);
    }
    progress.finish();

    Ok(written)
}

impl<'a> Command for ExtractCommand<'a> {
    fn execute(&self) -> RegionResult<()> {
        info!("Extracting regions from {} using {}", self.input_file, self.mode);

        let bytes = fs::read(&self.input_file)?;
        let response = self.kit.extract(&ExtractionRequest::new(bytes, self.mode.clone()));
        if !response.success {
            return Err(RegionError::GenericError(
                response.error.unwrap_or_else(|| "extraction failed".to_string())));
        }

        let dir = Path::new(&self.output_dir);
        let written = write_crops(dir, &response.images)?;
        if written.len() < response.images.len() {
            warn!("{} of {} crop(s) could not be written", response.images.len() - written.len(),
                  response.images.len());
        }
        let manifest = ExtractionResponse {
            total_found: written.len(),
            images: written,
            ..response
        };
        fs::write(dir.join(MANIFEST_FILE), manifest.to_json()?)?;

        info!("{}", manifest.summary);
        println!("{}", manifest.summary);
        println!("Output written to {}", self.output_dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::BoundingBox;
    use crate::detection::{DetectedRegion, RegionSource};

    fn crop(filename: &str) -> ExtractedImage {
        ExtractedImage {
            region: DetectedRegion::new(BoundingBox::new(0, 0, 8, 8), RegionSource::Contour, 0.8),
            png_data: vec![0x89, b'P', b'N', b'G'],
            width: 8,
            height: 8,
            filename: filename.to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    #[test]
    fn test_duplicate_names_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_crops(dir.path(), &[crop("logo.png"), crop("logo.png"), crop("logo.png")]).unwrap();

        let names: Vec<&str> = written.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["logo.png", "logo_2.png", "logo_3.png"]);
        assert!(dir.path().join("logo_3.png").exists());
    }

    #[test]
    fn test_failed_writes_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in the way makes the write fail
        fs::create_dir(dir.path().join("blocked.png")).unwrap();

        let written = write_crops(dir.path(), &[crop("blocked.png"), crop("free.png")]).unwrap();

        assert_eq!(written.len(), 1);
        assert_eq!(written[0].filename, "free.png");
    }
}
