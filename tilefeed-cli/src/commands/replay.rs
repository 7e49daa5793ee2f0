//! Replay command - drive the loader through a recorded list of views.
//!
//! The views file holds one viewport per line as
//! `zoom west south east north`. Blank lines and `#` comments are skipped.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tilefeed::config::ConfigFile;
use tilefeed::coord::BBox;
use tilefeed::host::{HeadlessHost, LngLatBounds};
use tilefeed::loader::{CycleOutcome, FeatureLoader, LoaderOptions};
use tilefeed::source::{FeatureSource, FgbSource, HttpSource, MemorySource};
use tracing::info;

use super::common::{resolve_id_property, resolve_min_zoom};
use crate::error::CliError;

/// Host source id used for the replay.
const REPLAY_SOURCE_ID: &str = "replay";

/// Arguments for the replay command.
pub struct ReplayArgs {
    pub views: PathBuf,
    pub data: Option<PathBuf>,
    pub url: Option<String>,
    /// Treat the URL as a GeoJSON service instead of a FlatGeobuf file.
    pub geojson: bool,
    pub id_property: Option<String>,
    pub min_zoom: Option<u8>,
}

/// One recorded view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedView {
    pub zoom: f64,
    pub bounds: BBox,
}

/// Parse a views file.
pub fn parse_views(text: &str) -> Result<Vec<RecordedView>, CliError> {
    let mut views = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let invalid = |message: String| CliError::ViewsFile {
            line: index + 1,
            message,
        };

        let numbers: Vec<f64> = line
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<_, _>>()
            .map_err(|e| invalid(e.to_string()))?;

        match numbers.as_slice() {
            &[zoom, west, south, east, north] => views.push(RecordedView {
                zoom,
                bounds: BBox::new(west, south, east, north),
            }),
            _ => {
                return Err(invalid(format!(
                    "expected 'zoom west south east north', got {} values",
                    numbers.len()
                )))
            }
        }
    }

    Ok(views)
}

fn read_views(path: &Path) -> Result<Vec<RecordedView>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    parse_views(&text)
}

fn remote_source(geojson: bool) -> Result<Arc<dyn FeatureSource>, CliError> {
    if geojson {
        Ok(Arc::new(HttpSource::new()?))
    } else {
        Ok(Arc::new(FgbSource::new()))
    }
}

/// Run the replay command.
pub fn run(args: ReplayArgs, config: &ConfigFile) -> Result<(), CliError> {
    let views = read_views(&args.views)?;
    let min_zoom = resolve_min_zoom(args.min_zoom, config);
    let id_property = resolve_id_property(args.id_property, config)?;

    let (url, source): (String, Arc<dyn FeatureSource>) = match args.data {
        Some(path) => {
            let source = MemorySource::load(&path)?;
            println!("Loaded {} features from {}", source.len(), path.display());
            (format!("file://{}", path.display()), Arc::new(source))
        }
        None => {
            let url = args
                .url
                .or_else(|| config.source.url.clone())
                .ok_or_else(|| {
                    CliError::Config(
                        "No data to replay against. Use --data, --url or set source.url"
                            .to_string(),
                    )
                })?;
            (url, remote_source(args.geojson)?)
        }
    };

    let options = LoaderOptions::new(url, id_property).with_min_zoom(min_zoom);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(replay(views, options, source))
}

async fn replay(
    views: Vec<RecordedView>,
    options: LoaderOptions,
    source: Arc<dyn FeatureSource>,
) -> Result<(), CliError> {
    let Some(first) = views.first() else {
        println!("No views to replay.");
        return Ok(());
    };

    let host = Arc::new(HeadlessHost::new(first.zoom, first.bounds.into()));
    let loader = FeatureLoader::builder()
        .source_id(REPLAY_SOURCE_ID)
        .host(host.clone())
        .source(source)
        .options(options)
        .build_detached()?;

    info!(
        views = views.len(),
        min_zoom = loader.options().min_zoom,
        "Replaying views"
    );

    println!();
    for (index, view) in views.iter().enumerate() {
        host.set_view(view.zoom, LngLatBounds::from(view.bounds));

        let summary = match loader.load_viewport().await {
            Ok(CycleOutcome::BelowMinZoom) => "below min zoom".to_string(),
            Ok(CycleOutcome::NothingNew) => "nothing new".to_string(),
            Ok(CycleOutcome::Loaded {
                tiles,
                added,
                duplicates,
                ..
            }) => format!(
                "{} new tiles, +{} features ({} duplicates)",
                tiles.len(),
                added,
                duplicates
            ),
            Err(e) => format!("failed: {}", e),
        };

        println!(
            "[{:>3}] z{:<5.2} {}  {}",
            index + 1,
            view.zoom,
            view.bounds,
            summary
        );
    }

    println!();
    println!("Summary");
    println!("=======");
    println!("{}", loader.telemetry());
    println!(
        "  Host features: {}",
        host.feature_count(REPLAY_SOURCE_ID).unwrap_or(0)
    );

    Ok(())
}
