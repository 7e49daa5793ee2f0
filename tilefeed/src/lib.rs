//! Tilefeed - viewport-driven incremental loading of vector features
//!
//! This library keeps a map's data source filled with the features that
//! are visible in the current view. Each time the view settles it works
//! out which quadtree tiles cover the view, skips tiles it has already
//! asked for, queries a spatial feature source once for the rest, and
//! republishes the deduplicated collection to the map.
//!
//! # Modules
//!
//! - [`coord`] - Web Mercator tile math and quadkeys
//! - [`coverage`] - Viewport to covering tiles, tile bounds merging
//! - [`request`] - Tiles already requested
//! - [`feature`] - GeoJSON features and identity deduplication
//! - [`source`] - Feature sources (HTTP, in-memory)
//! - [`host`] - The map host the loader publishes into
//! - [`loader`] - The load cycle and its lifecycle
//! - [`telemetry`] - Loader counters
//! - [`config`] - INI configuration file
//! - [`logging`] - `tracing` subscriber setup

pub mod config;
pub mod coord;
pub mod coverage;
pub mod feature;
pub mod host;
pub mod loader;
pub mod logging;
pub mod request;
pub mod source;
pub mod telemetry;

pub use loader::{CycleOutcome, FeatureLoader, LoaderError, LoaderOptions};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
