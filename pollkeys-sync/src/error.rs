//! Error types for pollkeys-sync.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from a single poll cycle.
///
/// None of these are fatal to a looping poller; they are logged and the next
/// cycle runs one interval later.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The HTTP request failed or returned a non-success status.
    #[error("failed to download {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The response arrived but could not be streamed into the temp file.
    #[error("failed to save {url} to {path}: {source}")]
    Save {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temp or target file could not be read back for fingerprinting.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Overwriting the target failed; the target may be partially written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn read_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Read {
        path: path.into(),
        source,
    }
}

pub(crate) fn write_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Write {
        path: path.into(),
        source,
    }
}
