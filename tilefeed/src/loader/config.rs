//! Loader options.

use super::LoaderError;
use crate::coord::MAX_ZOOM;

/// Zoom below which no requests are made, unless overridden.
pub const DEFAULT_MIN_ZOOM: u8 = 9;

/// What to load and how to deduplicate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Dataset location handed to the feature source on every query.
    pub url: String,
    /// Feature property whose value identifies a feature.
    pub id_property: String,
    /// Coarsest zoom at which tiles are requested.
    pub min_zoom: u8,
}

impl LoaderOptions {
    pub fn new(url: impl Into<String>, id_property: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            id_property: id_property.into(),
            min_zoom: DEFAULT_MIN_ZOOM,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_id_property(mut self, id_property: impl Into<String>) -> Self {
        self.id_property = id_property.into();
        self
    }

    pub fn with_min_zoom(mut self, min_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    /// Check that required fields are present and in range.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.url.trim().is_empty() {
            return Err(LoaderError::MissingUrl);
        }
        if self.id_property.trim().is_empty() {
            return Err(LoaderError::MissingIdProperty);
        }
        if self.min_zoom > MAX_ZOOM {
            return Err(LoaderError::InvalidMinZoom(self.min_zoom));
        }
        Ok(())
    }
}
