//! Addressable configuration keys (`section.key`).

use std::fmt;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};
use crate::coord::MAX_ZOOM;
use crate::logging::is_valid_level;

/// A single setting that can be read or written by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    SourceUrl,
    SourceIdProperty,
    SourceMinZoom,
    LoggingLevel,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::SourceUrl,
            ConfigKey::SourceIdProperty,
            ConfigKey::SourceMinZoom,
            ConfigKey::LoggingLevel,
        ]
    }

    /// Full name, e.g. `source.url`.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::SourceUrl => "source.url",
            ConfigKey::SourceIdProperty => "source.id_property",
            ConfigKey::SourceMinZoom => "source.min_zoom",
            ConfigKey::LoggingLevel => "logging.level",
        }
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::SourceUrl | ConfigKey::SourceIdProperty | ConfigKey::SourceMinZoom => {
                "source"
            }
            ConfigKey::LoggingLevel => "logging",
        }
    }

    /// Key within its section, e.g. `url`.
    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::SourceUrl => "url",
            ConfigKey::SourceIdProperty => "id_property",
            ConfigKey::SourceMinZoom => "min_zoom",
            ConfigKey::LoggingLevel => "level",
        }
    }

    /// Current value as text; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::SourceUrl => config.source.url.clone().unwrap_or_default(),
            ConfigKey::SourceIdProperty => config.source.id_property.clone().unwrap_or_default(),
            ConfigKey::SourceMinZoom => config
                .source
                .min_zoom
                .map(|z| z.to_string())
                .unwrap_or_default(),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Validate and store `value`. An empty value unsets optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let invalid = |reason: &str| ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::SourceUrl => {
                config.source.url = non_empty(value);
            }
            ConfigKey::SourceIdProperty => {
                config.source.id_property = non_empty(value);
            }
            ConfigKey::SourceMinZoom => {
                config.source.min_zoom = if value.is_empty() {
                    None
                } else {
                    let zoom: u8 = value
                        .parse()
                        .map_err(|_| invalid("expected a whole number"))?;
                    if zoom > MAX_ZOOM {
                        return Err(invalid("must be between 0 and 28"));
                    }
                    Some(zoom)
                };
            }
            ConfigKey::LoggingLevel => {
                if !is_valid_level(value) {
                    return Err(invalid("expected one of trace, debug, info, warn, error"));
                }
                config.logging.level = value.to_ascii_lowercase();
            }
        }

        Ok(())
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
