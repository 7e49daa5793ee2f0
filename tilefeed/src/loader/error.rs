//! Loader errors.

use thiserror::Error;

use crate::host::HostError;
use crate::source::SourceError;

/// Errors from constructing or running a [`FeatureLoader`](super::FeatureLoader).
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Missing source id")]
    MissingSourceId,

    #[error("Missing map host")]
    MissingHost,

    #[error("Missing loader options")]
    MissingOptions,

    #[error("Missing required option: url")]
    MissingUrl,

    #[error("Missing required option: id_property")]
    MissingIdProperty,

    #[error("Invalid min_zoom {0}: must be between 0 and 28")]
    InvalidMinZoom(u8),

    #[error("No Tokio runtime available to listen for view changes")]
    NoRuntime,

    #[error("Failed to encode host source spec: {0}")]
    SourceSpec(#[from] serde_json::Error),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),
}

impl LoaderError {
    /// True for construction-time validation failures.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LoaderError::MissingSourceId
                | LoaderError::MissingHost
                | LoaderError::MissingOptions
                | LoaderError::MissingUrl
                | LoaderError::MissingIdProperty
                | LoaderError::InvalidMinZoom(_)
        )
    }
}
