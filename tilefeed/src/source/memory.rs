//! In-memory feature source.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::{FeatureSource, FeatureStream, SourceError};
use crate::coord::BBox;
use crate::feature::{Feature, FeatureCollection};

/// A feature source backed by a collection held in memory.
///
/// Stands in for a single remote dataset: the `url` passed to
/// [`FeatureSource::query`] is ignored. Features are yielded in stored
/// order when their geometry extent touches the query rectangle; features
/// without coordinates never match.
pub struct MemorySource {
    features: Arc<Vec<Feature>>,
    queries: AtomicUsize,
}

impl MemorySource {
    /// Create a source over `features`.
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features: Arc::new(features),
            queries: AtomicUsize::new(0),
        }
    }

    /// Create a source from a parsed collection.
    pub fn from_collection(collection: FeatureCollection) -> Self {
        Self::new(collection.features)
    }

    /// Load a GeoJSON FeatureCollection (or newline-delimited features)
    /// from disk.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(super::parse_features(&bytes)?))
    }

    /// Number of features held.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of queries issued so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl FeatureSource for MemorySource {
    fn query(&self, _url: &str, bbox: BBox) -> FeatureStream {
        self.queries.fetch_add(1, Ordering::Relaxed);

        let features = Arc::clone(&self.features);
        let count = features.len();
        stream::iter((0..count).filter_map(move |i| {
            let feature = &features[i];
            feature
                .geometry_bbox()
                .filter(|extent| extent.intersects(&bbox))
                .map(|_| Ok(feature.clone()))
        }))
        .boxed()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
