//! Map host abstraction.
//!
//! The host is whatever renders the map: it knows the current camera,
//! owns named data sources, and announces when the view has settled after
//! a pan or zoom. The loader only talks to it through [`MapHost`].
//!
//! View-change subscriptions are `tokio::sync::broadcast` receivers.
//! Dropping the receiver is the unsubscription.

mod headless;

pub use headless::HeadlessHost;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::coord::BBox;
use crate::feature::FeatureCollection;

/// Errors reported by a map host.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HostError {
    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Source already exists: {0}")]
    DuplicateSource(String),

    #[error("Host rejected operation: {0}")]
    Rejected(String),
}

/// Visible bounds as south-west and north-east corners, `[lng, lat]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LngLatBounds {
    pub sw: [f64; 2],
    pub ne: [f64; 2],
}

impl LngLatBounds {
    pub fn new(sw: [f64; 2], ne: [f64; 2]) -> Self {
        Self { sw, ne }
    }

    /// As a `min/max` rectangle.
    pub fn to_bbox(&self) -> BBox {
        BBox::new(self.sw[0], self.sw[1], self.ne[0], self.ne[1])
    }
}

impl From<BBox> for LngLatBounds {
    fn from(b: BBox) -> Self {
        Self::new([b.min_x, b.min_y], [b.max_x, b.max_y])
    }
}

/// Fired when the map view has finished moving.
///
/// Carries no payload; listeners read the camera from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewChanged;

/// Host-side configuration for the data source the loader publishes into.
///
/// `overrides` are passed through to the host verbatim, except that
/// `type` and `data` are always set by the loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceSpec {
    pub overrides: Map<String, Value>,
}

/// The `type` every loader-managed host source is created with.
pub const SOURCE_TYPE: &str = "geojson";

impl SourceSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an override (e.g. `"cluster": true`).
    pub fn with_override(mut self, key: impl Into<String>, value: Value) -> Self {
        self.overrides.insert(key.into(), value);
        self
    }

    /// The object handed to [`MapHost::add_source`].
    pub fn to_value(&self, data: &FeatureCollection) -> Result<Value, serde_json::Error> {
        let mut spec = self.overrides.clone();
        spec.insert("type".to_string(), Value::String(SOURCE_TYPE.to_string()));
        spec.insert("data".to_string(), serde_json::to_value(data)?);
        Ok(Value::Object(spec))
    }
}

/// Capabilities the loader needs from the map.
pub trait MapHost: Send + Sync {
    /// Current (fractional) zoom.
    fn zoom(&self) -> f64;

    /// Currently visible bounds.
    fn bounds(&self) -> LngLatBounds;

    /// Register a data source.
    fn add_source(&self, id: &str, spec: Value) -> Result<(), HostError>;

    /// Remove a data source.
    fn remove_source(&self, id: &str) -> Result<(), HostError>;

    /// Replace a source's data.
    fn set_data(&self, id: &str, data: &FeatureCollection) -> Result<(), HostError>;

    /// Subscribe to view-changed notifications.
    fn subscribe_view_changes(&self) -> broadcast::Receiver<ViewChanged>;
}
