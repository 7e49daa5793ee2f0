//! In-process map host without a renderer.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::broadcast;

use super::{HostError, LngLatBounds, MapHost, ViewChanged};
use crate::feature::FeatureCollection;

/// Capacity of the view-change channel.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy)]
struct Camera {
    zoom: f64,
    bounds: LngLatBounds,
}

#[derive(Debug)]
struct HostedSource {
    spec: Value,
    data: Option<FeatureCollection>,
    publishes: usize,
}

/// A [`MapHost`] with a settable camera and an inspectable source registry.
///
/// Every `set_data` call is recorded: the last published collection and
/// the number of publishes per source.
pub struct HeadlessHost {
    camera: RwLock<Camera>,
    sources: Mutex<HashMap<String, HostedSource>>,
    events: broadcast::Sender<ViewChanged>,
}

impl HeadlessHost {
    /// Create a host looking at `bounds` at `zoom`.
    pub fn new(zoom: f64, bounds: LngLatBounds) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            camera: RwLock::new(Camera { zoom, bounds }),
            sources: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Move the camera and fire a view-changed event.
    ///
    /// Returns the number of subscribers notified.
    pub fn set_view(&self, zoom: f64, bounds: LngLatBounds) -> usize {
        *self.camera.write() = Camera { zoom, bounds };
        self.notify()
    }

    /// Fire a view-changed event without moving the camera.
    pub fn notify(&self) -> usize {
        self.events.send(ViewChanged).unwrap_or(0)
    }

    /// Number of live view-change subscriptions.
    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn has_source(&self, id: &str) -> bool {
        self.sources.lock().contains_key(id)
    }

    /// The settings object a source was registered with.
    pub fn source_spec(&self, id: &str) -> Option<Value> {
        self.sources.lock().get(id).map(|s| s.spec.clone())
    }

    /// How many times `set_data` was called for a source.
    pub fn publish_count(&self, id: &str) -> Option<usize> {
        self.sources.lock().get(id).map(|s| s.publishes)
    }

    /// The most recently published collection for a source.
    pub fn published(&self, id: &str) -> Option<FeatureCollection> {
        self.sources.lock().get(id).and_then(|s| s.data.clone())
    }

    /// Number of features in the most recent publish (0 if none yet).
    pub fn feature_count(&self, id: &str) -> Option<usize> {
        self.sources
            .lock()
            .get(id)
            .map(|s| s.data.as_ref().map_or(0, FeatureCollection::len))
    }
}

impl MapHost for HeadlessHost {
    fn zoom(&self) -> f64 {
        self.camera.read().zoom
    }

    fn bounds(&self) -> LngLatBounds {
        self.camera.read().bounds
    }

    fn add_source(&self, id: &str, spec: Value) -> Result<(), HostError> {
        let mut sources = self.sources.lock();
        if sources.contains_key(id) {
            return Err(HostError::DuplicateSource(id.to_string()));
        }
        sources.insert(
            id.to_string(),
            HostedSource {
                spec,
                data: None,
                publishes: 0,
            },
        );
        Ok(())
    }

    fn remove_source(&self, id: &str) -> Result<(), HostError> {
        self.sources
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HostError::UnknownSource(id.to_string()))
    }

    fn set_data(&self, id: &str, data: &FeatureCollection) -> Result<(), HostError> {
        let mut sources = self.sources.lock();
        let source = sources
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownSource(id.to_string()))?;
        source.data = Some(data.clone());
        source.publishes += 1;
        Ok(())
    }

    fn subscribe_view_changes(&self) -> broadcast::Receiver<ViewChanged> {
        self.events.subscribe()
    }
}
