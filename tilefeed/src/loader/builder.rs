//! Loader construction.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::debug;

use super::{FeatureLoader, LoaderError, LoaderOptions};
use crate::feature::FeatureCollection;
use crate::host::{MapHost, SourceSpec};
use crate::source::{FeatureSource, FgbSource};

/// Builder for [`FeatureLoader`].
///
/// Source id, host and options are required. Without an explicit feature
/// source, `options.url` is read as a FlatGeobuf file with [`FgbSource`].
///
/// Validation happens before anything touches the host: a failed build
/// leaves no source registered.
#[derive(Default)]
pub struct FeatureLoaderBuilder {
    source_id: Option<String>,
    host: Option<Arc<dyn MapHost>>,
    source: Option<Arc<dyn FeatureSource>>,
    options: Option<LoaderOptions>,
    spec: SourceSpec,
}

impl FeatureLoaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Host source id the loader publishes into.
    pub fn source_id(mut self, id: impl Into<String>) -> Self {
        self.source_id = Some(id.into());
        self
    }

    pub fn host(mut self, host: Arc<dyn MapHost>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn source(mut self, source: Arc<dyn FeatureSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn options(mut self, options: LoaderOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Extra settings for the host source (clustering, buffers, ...).
    pub fn source_spec(mut self, spec: SourceSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Build, register the host source, start listening and load the
    /// current view once.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<FeatureLoader, LoaderError> {
        let handle = Handle::try_current().map_err(|_| LoaderError::NoRuntime)?;

        let loader = self.build_detached()?;
        loader.enable_requests()?;
        loader.spawn_cycle(&handle);

        Ok(loader)
    }

    /// Build and register the host source without subscribing to view
    /// changes or loading anything.
    pub fn build_detached(self) -> Result<FeatureLoader, LoaderError> {
        let source_id = self
            .source_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(LoaderError::MissingSourceId)?;
        let host = self.host.ok_or(LoaderError::MissingHost)?;
        let options = self.options.ok_or(LoaderError::MissingOptions)?;
        options.validate()?;

        let source: Arc<dyn FeatureSource> = match self.source {
            Some(source) => source,
            None => Arc::new(FgbSource::new()),
        };

        let spec = self.spec.to_value(&FeatureCollection::new())?;
        host.add_source(&source_id, spec)?;

        debug!(
            source_id = %source_id,
            url = %options.url,
            min_zoom = options.min_zoom,
            source = source.name(),
            "Feature loader created"
        );

        Ok(FeatureLoader::new(source_id, options, host, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HeadlessHost, LngLatBounds};
    use crate::source::MemorySource;

    fn host() -> Arc<HeadlessHost> {
        Arc::new(HeadlessHost::new(
            10.0,
            LngLatBounds::new([13.3, 52.4], [13.5, 52.6]),
        ))
    }

    fn source() -> Arc<MemorySource> {
        Arc::new(MemorySource::new(Vec::new()))
    }

    #[test]
    fn test_missing_pieces() {
        let err = FeatureLoaderBuilder::new()
            .host(host())
            .options(LoaderOptions::new("u", "id"))
            .build_detached()
            .err();
        assert!(matches!(err, Some(LoaderError::MissingSourceId)));

        let err = FeatureLoaderBuilder::new()
            .source_id("a")
            .options(LoaderOptions::new("u", "id"))
            .build_detached()
            .err();
        assert!(matches!(err, Some(LoaderError::MissingHost)));

        let err = FeatureLoaderBuilder::new()
            .source_id("a")
            .host(host())
            .build_detached()
            .err();
        assert!(matches!(err, Some(LoaderError::MissingOptions)));
    }

    #[test]
    fn test_invalid_options_add_no_source() {
        let host = host();
        let err = FeatureLoaderBuilder::new()
            .source_id("a")
            .host(host.clone())
            .source(source())
            .options(LoaderOptions::new("u", ""))
            .build_detached()
            .err();

        assert!(matches!(err, Some(LoaderError::MissingIdProperty)));
        assert!(!host.has_source("a"));
    }

    #[test]
    fn test_build_detached_registers_source() {
        let host = host();
        let loader = FeatureLoaderBuilder::new()
            .source_id("places")
            .host(host.clone())
            .source(source())
            .options(LoaderOptions::new("u", "id"))
            .source_spec(SourceSpec::new().with_override("cluster", serde_json::json!(true)))
            .build_detached()
            .unwrap();

        assert!(!loader.is_listening());
        let spec = host.source_spec("places").unwrap();
        assert_eq!(spec["type"], "geojson");
        assert_eq!(spec["cluster"], true);
        assert_eq!(spec["data"]["features"].as_array().map(Vec::len), Some(0));
    }

    #[test]
    fn test_default_source_reads_flatgeobuf() {
        let loader = FeatureLoaderBuilder::new()
            .source_id("a")
            .host(host())
            .options(LoaderOptions::new("https://example.com/places.fgb", "id"))
            .build_detached()
            .unwrap();

        assert_eq!(loader.source_name(), "flatgeobuf");
    }

    #[test]
    fn test_build_outside_runtime() {
        let host = host();
        let err = FeatureLoaderBuilder::new()
            .source_id("a")
            .host(host.clone())
            .source(source())
            .options(LoaderOptions::new("u", "id"))
            .build()
            .err();

        assert!(matches!(err, Some(LoaderError::NoRuntime)));
        assert!(!host.has_source("a"));
    }

    #[test]
    fn test_duplicate_source_id() {
        let host = host();
        let build = || {
            FeatureLoaderBuilder::new()
                .source_id("a")
                .host(host.clone())
                .source(source())
                .options(LoaderOptions::new("u", "id"))
                .build_detached()
        };

        let _first = build().unwrap();
        assert!(matches!(
            build().err(),
            Some(LoaderError::Host(crate::host::HostError::DuplicateSource(_)))
        ));
    }
}
