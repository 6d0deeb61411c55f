//! One poll cycle: download, fingerprint, compare, conditionally replace.
//!
//! ## `synchronize` — steps
//!
//! 1. Download the remote into the temp path.
//! 2. Fingerprint the temp file.
//! 3. Fingerprint the target (a missing target is handled per
//!    [`MissingTargetPolicy`]).
//! 4. Equal fingerprints → return [`SyncOutcome::Unchanged`]; nothing written.
//! 5. Otherwise read the temp file and hand it to the [`Overwrite`] impl with
//!    the configured mode.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use pollkeys_core::{FileMode, MissingTargetPolicy, SyncConfig};

use crate::error::{read_err, SyncError};
use crate::fetch::{Fetch, HttpFetcher};
use crate::fingerprint::Fingerprint;
use crate::writer::{DiskWriter, Overwrite};

/// Result of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote and target content are identical; the target was not touched.
    Unchanged {
        path: PathBuf,
        fingerprint: Fingerprint,
    },
    /// The target now holds the downloaded content.
    Replaced {
        path: PathBuf,
        /// `None` when the target did not exist before this cycle.
        previous: Option<Fingerprint>,
        current: Fingerprint,
        bytes: u64,
    },
}

impl SyncOutcome {
    pub fn is_replaced(&self) -> bool {
        matches!(self, SyncOutcome::Replaced { .. })
    }
}

/// Synchronizes a local target against a remote URL.
#[derive(Debug, Clone)]
pub struct Synchronizer<F = HttpFetcher, W = DiskWriter> {
    fetcher: F,
    writer: W,
    temp_path: PathBuf,
    permissions: FileMode,
    missing_target: MissingTargetPolicy,
}

impl Synchronizer {
    /// HTTP fetcher and disk writer wired from a validated config.
    pub fn from_config(config: &SyncConfig) -> Self {
        Synchronizer::new(
            HttpFetcher::new(config.timeout),
            DiskWriter::new(config.replace),
            config.temp_path.clone(),
        )
        .with_permissions(config.permissions)
        .with_missing_target(config.missing_target)
    }
}

impl<F: Fetch, W: Overwrite> Synchronizer<F, W> {
    /// Default mode `0644`, default missing-target policy `fail`.
    pub fn new(fetcher: F, writer: W, temp_path: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            writer,
            temp_path: temp_path.into(),
            permissions: FileMode::default(),
            missing_target: MissingTargetPolicy::default(),
        }
    }

    pub fn with_permissions(mut self, permissions: FileMode) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_missing_target(mut self, policy: MissingTargetPolicy) -> Self {
        self.missing_target = policy;
        self
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Run one poll cycle for `target` against `remote_url`.
    pub fn synchronize(&self, target: &Path, remote_url: &str) -> Result<SyncOutcome, SyncError> {
        tracing::info!(remote = remote_url, "polling for changes");

        let bytes = match self.fetcher.fetch(remote_url, &self.temp_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::error!(remote = remote_url, "failed to download");
                return Err(err);
            }
        };
        tracing::info!(remote = remote_url, bytes, "successfully downloaded");

        let current = Fingerprint::from_file(&self.temp_path).map_err(|e| {
            tracing::error!("failed to get checksum of {}", self.temp_path.display());
            read_err(&self.temp_path, e)
        })?;

        let previous = match Fingerprint::from_file(target) {
            Ok(fp) => Some(fp),
            Err(e)
                if e.kind() == ErrorKind::NotFound
                    && self.missing_target == MissingTargetPolicy::Create =>
            {
                tracing::info!("{} does not exist yet, it will be created", target.display());
                None
            }
            Err(e) => {
                tracing::error!("failed to get checksum of {}", target.display());
                return Err(read_err(target, e));
            }
        };

        if previous == Some(current) {
            tracing::info!(fingerprint = %current, "checksums match, no changes necessary");
            return Ok(SyncOutcome::Unchanged {
                path: target.to_path_buf(),
                fingerprint: current,
            });
        }

        tracing::info!(
            fingerprint = %current,
            "changes detected, overwriting {}",
            target.display()
        );
        let contents = std::fs::read(&self.temp_path).map_err(|e| read_err(&self.temp_path, e))?;
        if let Err(err) = self.writer.overwrite(target, &contents, self.permissions) {
            tracing::error!("failed to overwrite {}", target.display());
            return Err(err);
        }
        tracing::info!("{} overwritten", target.display());

        Ok(SyncOutcome::Replaced {
            path: target.to_path_buf(),
            previous,
            current,
            bytes: contents.len() as u64,
        })
    }
}
