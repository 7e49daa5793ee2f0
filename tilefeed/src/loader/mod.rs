//! Viewport-driven feature loading.
//!
//! A [`FeatureLoader`] keeps one host data source filled with the features
//! visible in the current map view. Each time the view settles it runs a
//! load cycle:
//!
//! 1. Read zoom and bounds from the host. Below the minimum zoom, stop.
//! 2. Resolve the covering tiles and drop those already requested.
//!    If nothing is left, stop.
//! 3. Query the feature source once over the merged extent of the new
//!    tiles and drain the stream.
//! 4. Append features with unseen identities and republish the whole
//!    collection to the host.
//!
//! # Concurrency
//!
//! Cycles are not serialized. A view change that arrives while a cycle is
//! still draining its stream starts a second cycle alongside it. Shared
//! state (requested tiles, seen identities, the collection) sits behind a
//! single lock that is never held across an await, and every mutation is
//! append-only, so concurrent cycles converge. Publish order between
//! concurrent cycles is not defined.
//!
//! A failed stream leaves that cycle's tiles marked as requested; nothing
//! from it is committed or published. [`FeatureLoader::clear_requested_tiles`]
//! lets a caller make those tiles eligible again.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tilefeed::host::{HeadlessHost, LngLatBounds};
//! use tilefeed::loader::{CycleOutcome, FeatureLoader, LoaderOptions};
//! use tilefeed::source::MemorySource;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let host = Arc::new(HeadlessHost::new(
//!     12.0,
//!     LngLatBounds::new([13.38, 52.50], [13.42, 52.53]),
//! ));
//! let loader = FeatureLoader::builder()
//!     .source_id("places")
//!     .host(host.clone())
//!     .source(Arc::new(MemorySource::new(Vec::new())))
//!     .options(LoaderOptions::new("memory://places", "id"))
//!     .build_detached()
//!     .unwrap();
//!
//! let outcome = loader.load_viewport().await.unwrap();
//! assert!(matches!(outcome, CycleOutcome::Loaded { .. }));
//! assert!(matches!(loader.load_viewport().await.unwrap(), CycleOutcome::NothingNew));
//! # });
//! ```

mod builder;
mod config;
mod error;

pub use builder::FeatureLoaderBuilder;
pub use config::{LoaderOptions, DEFAULT_MIN_ZOOM};
pub use error::LoaderError;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::TryStreamExt;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::coord::{BBox, TileCoord};
use crate::coverage::{merge_bounds, resolve_coverage, Viewport};
use crate::feature::{Feature, FeatureAccumulator, FeatureCollection};
use crate::host::{MapHost, ViewChanged};
use crate::request::RequestTracker;
use crate::source::FeatureSource;
use crate::telemetry::{LoaderMetrics, TelemetrySnapshot};

/// Result of one load cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Zoom was below the minimum; nothing was requested.
    BelowMinZoom,
    /// Every covering tile had already been requested.
    NothingNew,
    /// A query ran and the collection was republished.
    Loaded {
        /// Newly requested tiles.
        tiles: Vec<TileCoord>,
        /// Rectangle the source was queried with.
        bbox: BBox,
        /// Features appended to the collection.
        added: usize,
        /// Features dropped as already held.
        duplicates: usize,
    },
}

/// Whether any cycle is currently waiting on its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Loading,
}

struct LoaderState {
    requested: RequestTracker,
    accumulator: FeatureAccumulator,
}

struct LoaderInner {
    source_id: String,
    options: LoaderOptions,
    host: Arc<dyn MapHost>,
    source: Arc<dyn FeatureSource>,
    state: Mutex<LoaderState>,
    metrics: LoaderMetrics,
    loading: AtomicUsize,
}

/// Marks a cycle as loading for as long as it lives.
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl LoaderInner {
    async fn run_cycle(&self) -> Result<CycleOutcome, LoaderError> {
        self.metrics.cycle_started();

        let zoom = self.host.zoom();
        if zoom < f64::from(self.options.min_zoom) {
            debug!(
                source_id = %self.source_id,
                zoom,
                min_zoom = self.options.min_zoom,
                "Below minimum zoom, skipping"
            );
            self.metrics.cycle_below_min_zoom();
            return Ok(CycleOutcome::BelowMinZoom);
        }

        let viewport = Viewport::new(zoom, self.host.bounds().to_bbox());
        let candidates = resolve_coverage(&viewport, self.options.min_zoom);
        let tiles = self.state.lock().requested.filter_new(candidates);

        let Some(bbox) = merge_bounds(&tiles) else {
            debug!(source_id = %self.source_id, "No new tiles in view");
            self.metrics.cycle_nothing_new();
            return Ok(CycleOutcome::NothingNew);
        };

        debug!(
            source_id = %self.source_id,
            tiles = tiles.len(),
            bbox = %bbox,
            "Querying new tiles"
        );
        self.metrics.query_issued(tiles.len());

        let staged: Vec<Feature> = {
            let _loading = LoadingGuard::enter(&self.loading);
            match self
                .source
                .query(&self.options.url, bbox)
                .try_collect()
                .await
            {
                Ok(features) => features,
                Err(e) => {
                    self.metrics.cycle_failed();
                    return Err(e.into());
                }
            }
        };

        let report = {
            let mut state = self.state.lock();
            let report = state.accumulator.accumulate(staged);
            self.metrics.accumulated(&report);
            if let Err(e) = self
                .host
                .set_data(&self.source_id, state.accumulator.collection())
            {
                self.metrics.cycle_failed();
                return Err(e.into());
            }
            self.metrics.published();
            report
        };

        info!(
            source_id = %self.source_id,
            tiles = tiles.len(),
            added = report.added,
            duplicates = report.duplicates,
            "Published features"
        );

        Ok(CycleOutcome::Loaded {
            tiles,
            bbox,
            added: report.added,
            duplicates: report.duplicates,
        })
    }
}

/// Run a cycle in the background, logging its failure.
fn spawn_cycle_on(handle: &Handle, inner: Arc<LoaderInner>) {
    handle.spawn(async move {
        if let Err(e) = inner.run_cycle().await {
            error!(source_id = %inner.source_id, error = %e, "Load cycle failed");
        }
    });
}

/// Dispatch a cycle per view change until cancelled.
async fn listen(
    inner: Arc<LoaderInner>,
    mut events: broadcast::Receiver<ViewChanged>,
    token: CancellationToken,
    handle: Handle,
) {
    debug!(source_id = %inner.source_id, "View change listener started");

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            event = events.recv() => match event {
                Ok(ViewChanged) => spawn_cycle_on(&handle, Arc::clone(&inner)),
                Err(RecvError::Lagged(missed)) => {
                    warn!(source_id = %inner.source_id, missed, "View change events dropped");
                    spawn_cycle_on(&handle, Arc::clone(&inner));
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    debug!(source_id = %inner.source_id, "View change listener stopped");
}

/// Keeps a host data source filled with the features in view.
///
/// Create one with [`FeatureLoader::builder`]. Dropping the loader stops
/// listening but leaves the host source in place; use
/// [`destroy_source`](Self::destroy_source) to remove it.
pub struct FeatureLoader {
    inner: Arc<LoaderInner>,
    listener: Mutex<Option<CancellationToken>>,
}

impl FeatureLoader {
    pub fn builder() -> FeatureLoaderBuilder {
        FeatureLoaderBuilder::new()
    }

    fn new(
        source_id: String,
        options: LoaderOptions,
        host: Arc<dyn MapHost>,
        source: Arc<dyn FeatureSource>,
    ) -> Self {
        let state = LoaderState {
            requested: RequestTracker::new(),
            accumulator: FeatureAccumulator::new(options.id_property.clone()),
        };
        Self {
            inner: Arc::new(LoaderInner {
                source_id,
                options,
                host,
                source,
                state: Mutex::new(state),
                metrics: LoaderMetrics::new(),
                loading: AtomicUsize::new(0),
            }),
            listener: Mutex::new(None),
        }
    }

    pub(crate) fn spawn_cycle(&self, handle: &Handle) {
        spawn_cycle_on(handle, Arc::clone(&self.inner));
    }

    /// Run one load cycle for the current view and wait for it.
    pub async fn load_viewport(&self) -> Result<CycleOutcome, LoaderError> {
        self.inner.run_cycle().await
    }

    /// Start reacting to view changes. No-op if already listening.
    pub fn enable_requests(&self) -> Result<(), LoaderError> {
        let mut listener = self.listener.lock();
        if listener.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return Ok(());
        }

        let handle = Handle::try_current().map_err(|_| LoaderError::NoRuntime)?;
        let events = self.inner.host.subscribe_view_changes();
        let token = CancellationToken::new();
        handle.spawn(listen(
            Arc::clone(&self.inner),
            events,
            token.clone(),
            handle.clone(),
        ));
        *listener = Some(token);
        Ok(())
    }

    /// Stop reacting to view changes. Cycles already running finish.
    pub fn disable_requests(&self) {
        if let Some(token) = self.listener.lock().take() {
            token.cancel();
            debug!(source_id = %self.inner.source_id, "Requests disabled");
        }
    }

    /// Stop listening and remove the host data source.
    pub fn destroy_source(&self) -> Result<(), LoaderError> {
        self.disable_requests();
        self.inner.host.remove_source(&self.inner.source_id)?;
        info!(source_id = %self.inner.source_id, "Source destroyed");
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Forget every requested tile so the next cycle fetches them again.
    ///
    /// Held features are kept; refetched duplicates are dropped by identity.
    /// Returns the number of tiles forgotten.
    pub fn clear_requested_tiles(&self) -> usize {
        let cleared = self.inner.state.lock().requested.clear();
        debug!(source_id = %self.inner.source_id, cleared, "Requested tiles cleared");
        cleared
    }

    pub fn source_id(&self) -> &str {
        &self.inner.source_id
    }

    /// Name of the feature source in use.
    pub fn source_name(&self) -> &'static str {
        self.inner.source.name()
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.inner.options
    }

    pub fn state(&self) -> CycleState {
        if self.inner.loading.load(Ordering::SeqCst) > 0 {
            CycleState::Loading
        } else {
            CycleState::Idle
        }
    }

    pub fn metrics(&self) -> &LoaderMetrics {
        &self.inner.metrics
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.inner.metrics.snapshot()
    }

    /// Number of distinct features held.
    pub fn feature_count(&self) -> usize {
        self.inner.state.lock().accumulator.len()
    }

    pub fn requested_tile_count(&self) -> usize {
        self.inner.state.lock().requested.len()
    }

    /// Copy of the accumulated collection.
    pub fn collection(&self) -> FeatureCollection {
        self.inner.state.lock().accumulator.collection().clone()
    }
}

impl Drop for FeatureLoader {
    fn drop(&mut self) {
        if let Some(token) = self.listener.get_mut().take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, LngLatBounds};
    use crate::source::{FeatureStream, MemorySource, SourceError};
    use futures::stream::{self, StreamExt};
    use serde_json::json;

    fn point(id: i64, lon: f64, lat: f64) -> Feature {
        let mut props = serde_json::Map::new();
        props.insert("id".to_string(), json!(id));
        Feature::new(json!({"type": "Point", "coordinates": [lon, lat]}), props)
    }

    fn berlin() -> LngLatBounds {
        LngLatBounds::new([13.38, 52.50], [13.42, 52.53])
    }

    fn loader_with(
        host: Arc<HeadlessHost>,
        source: Arc<dyn FeatureSource>,
        min_zoom: u8,
    ) -> FeatureLoader {
        FeatureLoader::builder()
            .source_id("places")
            .host(host)
            .source(source)
            .options(LoaderOptions::new("memory://", "id").with_min_zoom(min_zoom))
            .build_detached()
            .unwrap()
    }

    struct BrokenSource;

    impl FeatureSource for BrokenSource {
        fn query(&self, _url: &str, _bbox: BBox) -> FeatureStream {
            stream::iter(vec![
                Ok(point(1, 13.4, 52.51)),
                Err(SourceError::Malformed("truncated".to_string())),
            ])
            .boxed()
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_cycle_loads_and_dedups() {
        let host = Arc::new(HeadlessHost::new(12.0, berlin()));
        let source = Arc::new(MemorySource::new(vec![
            point(1, 13.40, 52.51),
            point(2, 13.41, 52.52),
            point(1, 13.40, 52.51),
        ]));
        let loader = loader_with(host.clone(), source.clone(), 9);

        let outcome = loader.load_viewport().await.unwrap();
        match outcome {
            CycleOutcome::Loaded {
                tiles,
                added,
                duplicates,
                ..
            } => {
                assert_eq!(tiles.len(), 1);
                assert_eq!(added, 2);
                assert_eq!(duplicates, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        assert_eq!(host.feature_count("places"), Some(2));
        assert_eq!(loader.state(), CycleState::Idle);
        assert_eq!(source.query_count(), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_is_nothing_new() {
        let host = Arc::new(HeadlessHost::new(12.0, berlin()));
        let source = Arc::new(MemorySource::new(vec![point(1, 13.4, 52.51)]));
        let loader = loader_with(host.clone(), source.clone(), 9);

        loader.load_viewport().await.unwrap();
        assert_eq!(
            loader.load_viewport().await.unwrap(),
            CycleOutcome::NothingNew
        );
        assert_eq!(source.query_count(), 1);
        assert_eq!(host.publish_count("places"), Some(1));
    }

    #[tokio::test]
    async fn test_below_min_zoom() {
        let host = Arc::new(HeadlessHost::new(5.0, berlin()));
        let source = Arc::new(MemorySource::new(vec![point(1, 13.4, 52.51)]));
        let loader = loader_with(host.clone(), source.clone(), 9);

        assert_eq!(
            loader.load_viewport().await.unwrap(),
            CycleOutcome::BelowMinZoom
        );
        assert_eq!(source.query_count(), 0);
        assert_eq!(loader.feature_count(), 0);
        assert_eq!(loader.requested_tile_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_stream_commits_nothing() {
        let host = Arc::new(HeadlessHost::new(12.0, berlin()));
        let loader = loader_with(host.clone(), Arc::new(BrokenSource), 9);

        let err = loader.load_viewport().await.unwrap_err();
        assert!(matches!(err, LoaderError::Source(SourceError::Malformed(_))));

        assert_eq!(loader.feature_count(), 0);
        assert_eq!(host.publish_count("places"), Some(0));
        assert!(loader.requested_tile_count() > 0);
        assert_eq!(
            loader.load_viewport().await.unwrap(),
            CycleOutcome::NothingNew
        );
        assert_eq!(loader.telemetry().cycles_failed, 1);
    }

    #[tokio::test]
    async fn test_clear_requested_tiles_allows_refetch() {
        let host = Arc::new(HeadlessHost::new(12.0, berlin()));
        let source = Arc::new(MemorySource::new(vec![point(1, 13.4, 52.51)]));
        let loader = loader_with(host.clone(), source.clone(), 9);

        loader.load_viewport().await.unwrap();
        assert!(loader.clear_requested_tiles() > 0);
        assert_eq!(loader.requested_tile_count(), 0);

        match loader.load_viewport().await.unwrap() {
            CycleOutcome::Loaded {
                added, duplicates, ..
            } => {
                assert_eq!(added, 0);
                assert_eq!(duplicates, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(loader.feature_count(), 1);
        assert_eq!(source.query_count(), 2);
    }

    #[tokio::test]
    async fn test_enable_disable() {
        let host = Arc::new(HeadlessHost::new(12.0, berlin()));
        let loader = loader_with(host.clone(), Arc::new(MemorySource::new(Vec::new())), 9);

        assert!(!loader.is_listening());
        loader.enable_requests().unwrap();
        loader.enable_requests().unwrap();
        assert!(loader.is_listening());

        loader.disable_requests();
        assert!(!loader.is_listening());

        loader.enable_requests().unwrap();
        assert!(loader.is_listening());
    }

    #[test]
    fn test_enable_requires_runtime() {
        let host = Arc::new(HeadlessHost::new(12.0, berlin()));
        let loader = loader_with(host, Arc::new(MemorySource::new(Vec::new())), 9);
        assert!(matches!(
            loader.enable_requests(),
            Err(LoaderError::NoRuntime)
        ));
    }
}
