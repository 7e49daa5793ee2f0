//! CLI error type.

use thiserror::Error;
use tilefeed::config::ConfigError;
use tilefeed::loader::LoaderError;
use tilefeed::source::SourceError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid views file, line {line}: {message}")]
    ViewsFile { line: usize, message: String },

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
