//! Tilefeed CLI - Command-line interface
//!
//! Plans tile coverage for a viewport and replays recorded views through
//! the feature loader.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tilefeed::config::{config_file_path, ConfigFile};
use tilefeed::coord::BBox;
use tilefeed::logging::init_logging;

use commands::common::parse_bounds;
use commands::config::ConfigCommands;
use commands::plan::PlanArgs;
use commands::replay::ReplayArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilefeed")]
#[command(version = tilefeed::VERSION)]
#[command(about = "Viewport-driven incremental feature loading", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tiles a viewport would request
    Plan {
        /// Viewport bounds as west,south,east,north
        #[arg(long, value_parser = parse_bounds, allow_hyphen_values = true)]
        bounds: BBox,

        /// Current map zoom (skips planning when below the minimum zoom)
        #[arg(long)]
        zoom: Option<f64>,

        /// Minimum zoom at which tiles are requested
        #[arg(long)]
        min_zoom: Option<u8>,
    },

    /// Replay recorded views through the loader
    Replay {
        /// File with one `zoom west south east north` view per line
        #[arg(long)]
        views: PathBuf,

        /// GeoJSON file to load features from
        #[arg(long, conflicts_with = "url")]
        data: Option<PathBuf>,

        /// Remote FlatGeobuf file (read with HTTP range requests)
        #[arg(long)]
        url: Option<String>,

        /// Query --url as a GeoJSON service with ?bbox= instead
        #[arg(long, conflicts_with = "data")]
        geojson: bool,

        /// Feature property that identifies a feature
        #[arg(long)]
        id_property: Option<String>,

        /// Minimum zoom at which tiles are requested
        #[arg(long)]
        min_zoom: Option<u8>,
    },

    /// View and modify configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.unwrap_or_else(config_file_path);
    let config = ConfigFile::load_from(&config_path)?;

    let level = cli
        .log_level
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level);

    match cli.command {
        Commands::Plan {
            bounds,
            zoom,
            min_zoom,
        } => commands::plan::run(
            PlanArgs {
                bounds,
                zoom,
                min_zoom,
            },
            &config,
        ),
        Commands::Replay {
            views,
            data,
            url,
            geojson,
            id_property,
            min_zoom,
        } => commands::replay::run(
            ReplayArgs {
                views,
                data,
                url,
                geojson,
                id_property,
                min_zoom,
            },
            &config,
        ),
        Commands::Config { command } => commands::config::run(command, &config_path),
    }
}
