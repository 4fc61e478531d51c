use clap::{Arg, Command as ClapCommand, ArgAction};
use std::process;
use log::{error, LevelFilter};

use regionkit::utils::logger::Logger;
use regionkit::commands::{build_region_kit, CommandFactory, RegionkitCommandFactory};

fn main() {
    let matches = ClapCommand::new("RegionKit")
        .version("0.1.0")
        .author("Maurice Schilpp")
        .about("Detect and extract visual regions from screenshots and composite graphics")
        .arg(
            Arg::new("input")
                .help("Input image file (PNG, JPEG, ...)")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .help("Extraction mode: grid, sections, components, contour, floodfill, uiCards, aiRegions, hybrid")
                .value_name("MODE")
                .default_value("hybrid"),
        )
        .arg(
            Arg::new("rows")
                .long("rows")
                .help("Grid rows")
                .value_name("N")
                .required(false),
        )
        .arg(
            Arg::new("columns")
                .long("columns")
                .help("Grid columns")
                .value_name("N")
                .required(false),
        )
        .arg(
            Arg::new("min-size")
                .long("min-size")
                .help("Minimum region width and height in pixels")
                .value_name("PIXELS")
                .required(false),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .help("Contour color threshold (0-255)")
                .value_name("VALUE")
                .required(false),
        )
        .arg(
            Arg::new("tolerance")
                .long("tolerance")
                .help("Flood fill color tolerance (0-255)")
                .value_name("VALUE")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output directory for crops and manifest")
                .value_name("DIR")
                .required(false),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file overriding detector parameters")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("ai-response")
                .long("ai-response")
                .help("Replay a saved vision model answer as the AI oracle")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("analyze")
                .short('a')
                .long("analyze")
                .help("Report what each detector finds without writing crops")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log output to this file")
                .value_name("FILE")
                .required(false),
        )
        .get_matches();

    match matches.get_one::<String>("log-file") {
        Some(log_file) => {
            if let Err(e) = Logger::init_global_logger(log_file) {
                eprintln!("Error setting up global logger: {}", e);
                process::exit(1);
            }
        }
        None => {
            let level = if matches.get_flag("verbose") { LevelFilter::Debug } else { LevelFilter::Info };
            env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .init();
        }
    }

    let kit = match build_region_kit(&matches) {
        Ok(kit) => kit,
        Err(e) => {
            error!("Failed to set up extraction: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let factory = RegionkitCommandFactory::new();

    let command_result = factory.create_command(&matches, &kit);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
