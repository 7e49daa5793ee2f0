//! Feature source abstraction
//!
//! A feature source answers one kind of question: "which features of the
//! dataset at `url` intersect this rectangle?" The answer is a lazy stream;
//! nothing is fetched until the stream is polled.
//!
//! # Implementations
//!
//! - [`FgbSource`] - a remote FlatGeobuf file, searched through its spatial
//!   index with HTTP range requests (the default)
//! - [`MemorySource`] - an in-memory collection, filtered by geometry extent
//! - [`HttpSource`] - a GeoJSON web service queried with a `bbox` parameter

mod fgb;
mod http;
mod memory;

pub use fgb::FgbSource;
pub use http::{parse_features, HttpSource};
pub use memory::MemorySource;

use futures::stream::BoxStream;
use thiserror::Error;

use crate::coord::BBox;
use crate::feature::Feature;

/// Lazy, finite stream of decoded features.
pub type FeatureStream = BoxStream<'static, Result<Feature, SourceError>>;

/// Errors that can occur while querying a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// FlatGeobuf open, index search or decode failure.
    #[error("FlatGeobuf error: {0}")]
    Fgb(String),

    /// Payload could not be decoded.
    #[error("Malformed payload: {0}")]
    Malformed(String),

    /// Local I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for feature sources.
///
/// The trait returns boxed streams so it can be used as a trait object,
/// letting the loader hold any source behind `Arc<dyn FeatureSource>`.
pub trait FeatureSource: Send + Sync {
    /// Query features intersecting `bbox` from the dataset at `url`.
    fn query(&self, url: &str, bbox: BBox) -> FeatureStream;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
