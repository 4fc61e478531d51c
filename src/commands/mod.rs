//! CLI command implementations
//!
//! This module contains implementations of various commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod extract_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use extract_command::ExtractCommand;

use clap::ArgMatches;
use log::info;

use crate::api::RegionKit;
use crate::config::ExtractionConfig;
use crate::detection::ExtractionMode;
use crate::errors::{RegionError, RegionResult};
use crate::providers::RecordedCompletionProvider;

/// Factory for creating command instances based on CLI arguments
///
/// This factory examines the command-line arguments and creates
/// the appropriate command instance for execution.
pub struct RegionkitCommandFactory;

impl RegionkitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        RegionkitCommandFactory
    }
}

impl Default for RegionkitCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for RegionkitCommandFactory {
    fn create_command(&self, args: &ArgMatches, kit: &'a RegionKit) -> RegionResult<Box<dyn Command + 'a>> {
        if args.get_flag("analyze") {
            Ok(Box::new(AnalyzeCommand::new(args, kit)?))
        } else {
            // Default to extraction
            Ok(Box::new(ExtractCommand::new(args, kit)?))
        }
    }
}

/// Build the extraction engine from CLI arguments
///
/// Loads `--config` when given and attaches a replayed oracle answer when
/// `--ai-response` is given.
pub fn build_region_kit(args: &ArgMatches) -> RegionResult<RegionKit> {
    let config = match args.get_one::<String>("config") {
        Some(path) => {
            info!("Loading configuration from {}", path);
            ExtractionConfig::from_file(path)?
        }
        None => ExtractionConfig::default(),
    };

    let mut kit = RegionKit::new(config);
    if let Some(path) = args.get_one::<String>("ai-response") {
        kit = kit.with_vision_provider(Box::new(RecordedCompletionProvider::from_file(path)?));
    }
    Ok(kit)
}

/// Parse an optional numeric argument
fn parse_arg<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> RegionResult<Option<T>> {
    match args.get_one::<String>(name) {
        Some(raw) => raw.parse::<T>()
            .map(Some)
            .map_err(|_| RegionError::InvalidParameter(format!("Invalid value for --{}: {}", name, raw))),
        None => Ok(None),
    }
}

/// Resolve the extraction mode, applying per-mode CLI overrides
///
/// `--rows`/`--columns` apply to grid, `--min-size` to the pixel detectors,
/// `--threshold` to contour and `--tolerance` to flood fill.
pub fn mode_from_args(args: &ArgMatches, config: &ExtractionConfig) -> RegionResult<ExtractionMode> {
    let name = args.get_one::<String>("mode").map(String::as_str).unwrap_or("hybrid");
    let mut mode = ExtractionMode::from_name(name, config)?;

    let min = parse_arg::<u32>(args, "min-size")?;
    match &mut mode {
        ExtractionMode::Grid { rows, columns } => {
            if let Some(r) = parse_arg(args, "rows")? {
                *rows = r;
            }
            if let Some(c) = parse_arg(args, "columns")? {
                *columns = c;
            }
        }
        ExtractionMode::Components { min_size } | ExtractionMode::UiCards { min_size } => {
            if let Some(m) = min {
                *min_size = m;
            }
        }
        ExtractionMode::Contour { min_size, color_threshold } => {
            if let Some(m) = min {
                *min_size = m;
            }
            if let Some(t) = parse_arg(args, "threshold")? {
                *color_threshold = t;
            }
        }
        ExtractionMode::FloodFill { min_size, tolerance } => {
            if let Some(m) = min {
                *min_size = m;
            }
            if let Some(t) = parse_arg(args, "tolerance")? {
                *tolerance = t;
            }
        }
        ExtractionMode::Sections | ExtractionMode::AiRegions | ExtractionMode::Hybrid => {}
    }

    info!("Extraction mode: {:?}", mode);
    Ok(mode)
}
