//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ConfigError;

/// Errors that can occur while loading, validating, or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A field is outside its allowed range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// The settings produced an invalid timer configuration.
    #[error("invalid timer configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Reading or writing the settings file failed.
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Neither `FOCUSFLOW_HOME` nor a home directory is available.
    #[error("could not determine the focusflow data directory")]
    NoDataDir,
}
