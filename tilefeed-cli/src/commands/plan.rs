//! Plan command - show which tiles a viewport would request.

use tilefeed::config::ConfigFile;
use tilefeed::coord::{bbox_to_tile, BBox};
use tilefeed::coverage::{merge_bounds, resolve_coverage, Viewport};

use super::common::resolve_min_zoom;
use crate::error::CliError;

/// Arguments for the plan command.
pub struct PlanArgs {
    pub bounds: BBox,
    pub zoom: Option<f64>,
    pub min_zoom: Option<u8>,
}

/// Run the plan command.
pub fn run(args: PlanArgs, config: &ConfigFile) -> Result<(), CliError> {
    let min_zoom = resolve_min_zoom(args.min_zoom, config);
    let primary = bbox_to_tile(&args.bounds);

    println!("Viewport:     {}", args.bounds);
    println!("Primary tile: {} ({})", primary, primary.quadkey());
    println!("Min zoom:     {}", min_zoom);

    if let Some(zoom) = args.zoom {
        if zoom < f64::from(min_zoom) {
            println!();
            println!(
                "Zoom {} is below the minimum zoom; no tiles would be requested.",
                zoom
            );
            return Ok(());
        }
    }

    let viewport = Viewport::new(args.zoom.unwrap_or(f64::from(min_zoom)), args.bounds);
    let tiles = resolve_coverage(&viewport, min_zoom);

    println!();
    println!("Covering tiles ({}):", tiles.len());
    for tile in &tiles {
        println!("  {:<16} {}", tile.to_string(), tile.quadkey());
    }

    if let Some(bbox) = merge_bounds(&tiles) {
        println!();
        println!("Query bbox:   {}", bbox);
    }

    Ok(())
}
