//! Error types for pollkeys-core.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while assembling a [`crate::SyncConfig`].
///
/// All variants are fatal: the process exits before any synchronization
/// attempt is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("remote url required; use --remote <url> to specify a remote target")]
    MissingRemote,

    #[error("invalid remote url '{url}': {reason}")]
    InvalidRemote { url: String, reason: String },

    /// No `--path` given and the home directory could not be determined.
    #[error("local file path is required; use --path <path/to/file> to specify a local file location")]
    MissingTarget,

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("failed to convert permissions '{value}' to file mode: {reason}")]
    InvalidPermissions { value: String, reason: String },

    #[error("failed to parse interval '{value}': {reason}")]
    InvalidInterval { value: String, reason: String },

    #[error("failed to parse timeout '{value}': {reason}")]
    InvalidTimeout { value: String, reason: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with the file path for context.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}
