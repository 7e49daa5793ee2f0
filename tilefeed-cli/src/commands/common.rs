//! Common types and utilities shared across CLI commands.

use tilefeed::config::ConfigFile;
use tilefeed::coord::BBox;
use tilefeed::loader::DEFAULT_MIN_ZOOM;

use crate::error::CliError;

/// Parse `west,south,east,north` into a bounding box.
///
/// Used as a clap value parser.
pub fn parse_bounds(s: &str) -> Result<BBox, String> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("expected four numbers W,S,E,N: {}", e))?;

    match parts.as_slice() {
        &[west, south, east, north] => {
            if west > east || south > north {
                return Err(format!(
                    "west/south must not exceed east/north (got {})",
                    s
                ));
            }
            Ok(BBox::new(west, south, east, north))
        }
        _ => Err(format!("expected four numbers W,S,E,N, got {}", parts.len())),
    }
}

/// Minimum zoom: CLI > config > default.
pub fn resolve_min_zoom(cli: Option<u8>, config: &ConfigFile) -> u8 {
    cli.or(config.source.min_zoom).unwrap_or(DEFAULT_MIN_ZOOM)
}

/// Identity property: CLI > config, required.
pub fn resolve_id_property(cli: Option<String>, config: &ConfigFile) -> Result<String, CliError> {
    cli.or_else(|| config.source.id_property.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No identity property. Set source.id_property in config.ini or use --id-property"
                    .to_string(),
            )
        })
}
