//! Remote download into the scratch file.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::SyncError;

/// Something that can place the content of `url` at `dest`.
pub trait Fetch {
    /// Download `url` into `dest`, replacing whatever was there.
    ///
    /// Returns the number of bytes written. `dest` is left alone if no
    /// response was received.
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, SyncError>;
}

/// Blocking HTTP(S) fetcher backed by a `ureq` agent.
///
/// Non-2xx statuses are reported as [`SyncError::Download`]. The body is
/// streamed to disk, never held in memory as a whole.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Build a fetcher. `timeout` bounds the whole request when set.
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder =
            ureq::AgentBuilder::new().user_agent(concat!("pollkeys/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<u64, SyncError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| SyncError::Download {
                url: url.to_string(),
                source: e.into(),
            })?;
        tracing::debug!(remote = url, status = response.status(), "response received");

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| save_err(url, parent, e))?;
        }
        let mut out = File::create(dest).map_err(|e| save_err(url, dest, e))?;
        let mut body = response.into_reader();
        std::io::copy(&mut body, &mut out).map_err(|e| save_err(url, dest, e))
    }
}

fn save_err(url: &str, path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Save {
        url: url.to_string(),
        path: path.into(),
        source,
    }
}
