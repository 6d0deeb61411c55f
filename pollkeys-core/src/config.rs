//! Configuration assembly.
//!
//! Values come from two layers: an optional YAML file and command-line flags.
//! Both are captured as a [`ConfigBuilder`] of raw, optional values; the CLI
//! layer is merged over the file layer and [`ConfigBuilder::build_at`]
//! validates the result into an immutable [`SyncConfig`].
//!
//! # API pattern
//!
//! - `build_at(home)` — explicit home; used in tests with `TempDir`
//! - `build()` — derives home from `dirs::home_dir()`, delegates to `build_at`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{parse_duration, FileMode, MissingTargetPolicy, PollInterval, ReplaceMode};

/// Scratch download location used when `--temp` is not given.
pub const DEFAULT_TEMP_PATH: &str = "/tmp/keys.txt";

/// `~/.ssh/authorized_keys`, relative to the home directory.
pub const DEFAULT_TARGET_RELATIVE: &str = ".ssh/authorized_keys";

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

/// Fully validated settings for a polling run. Never mutated after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub remote_url: String,
    pub target_path: PathBuf,
    pub temp_path: PathBuf,
    pub permissions: FileMode,
    pub interval: PollInterval,
    /// Whole-request HTTP timeout; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub missing_target: MissingTargetPolicy,
    pub replace: ReplaceMode,
}

/// Default target path under `home`.
pub fn default_target_at(home: &Path) -> PathBuf {
    home.join(DEFAULT_TARGET_RELATIVE)
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// A scalar as written in YAML, so that `interval: 0` and `interval: "0"`
/// mean the same thing.
///
/// YAML resolves `0o644` and `644` to integers before they reach us, so the
/// digits the user typed are lost. Permissions therefore only accept
/// [`RawValue::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    Number(u64),
}

impl RawValue {
    fn into_text(self) -> String {
        match self {
            RawValue::Text(s) => s,
            RawValue::Number(n) => n.to_string(),
        }
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_owned())
    }
}

/// One layer of unvalidated configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigBuilder {
    pub remote: Option<String>,
    pub path: Option<PathBuf>,
    pub temp: Option<PathBuf>,
    pub perms: Option<RawValue>,
    pub interval: Option<RawValue>,
    pub timeout: Option<RawValue>,
    pub missing_target: Option<MissingTargetPolicy>,
    pub atomic: Option<bool>,
}

impl ConfigBuilder {
    /// Load a layer from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Overlay `overrides` on top of `self`; set values in `overrides` win.
    pub fn merge(self, overrides: ConfigBuilder) -> ConfigBuilder {
        ConfigBuilder {
            remote: overrides.remote.or(self.remote),
            path: overrides.path.or(self.path),
            temp: overrides.temp.or(self.temp),
            perms: overrides.perms.or(self.perms),
            interval: overrides.interval.or(self.interval),
            timeout: overrides.timeout.or(self.timeout),
            missing_target: overrides.missing_target.or(self.missing_target),
            atomic: overrides.atomic.or(self.atomic),
        }
    }

    /// Validate into a [`SyncConfig`], resolving the default target under `home`.
    pub fn build_at(self, home: Option<&Path>) -> Result<SyncConfig, ConfigError> {
        let remote_url = validate_remote(self.remote)?;

        let target_path = match self.path {
            Some(path) if path.as_os_str().is_empty() => return Err(ConfigError::MissingTarget),
            Some(path) => path,
            None => default_target_at(home.ok_or(ConfigError::MissingTarget)?),
        };

        let temp_path = self
            .temp
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_PATH));
        if temp_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty { field: "temp path" });
        }

        let permissions = match self.perms {
            Some(RawValue::Text(value)) => value
                .parse::<FileMode>()
                .map_err(|reason| ConfigError::InvalidPermissions { value, reason })?,
            Some(RawValue::Number(n)) => {
                return Err(ConfigError::InvalidPermissions {
                    value: n.to_string(),
                    reason: "YAML read the mode as a number; quote it, e.g. perms: \"0644\""
                        .to_string(),
                })
            }
            None => FileMode::default(),
        };

        let interval = match self.interval {
            Some(raw) => {
                let value = raw.into_text();
                value
                    .parse::<PollInterval>()
                    .map_err(|reason| ConfigError::InvalidInterval { value, reason })?
            }
            None => PollInterval::ONCE,
        };

        let timeout = match self.timeout {
            Some(raw) => {
                let value = raw.into_text();
                let d = parse_duration(&value)
                    .map_err(|reason| ConfigError::InvalidTimeout { value, reason })?;
                (!d.is_zero()).then_some(d)
            }
            None => None,
        };

        let replace = if self.atomic.unwrap_or(false) {
            ReplaceMode::Atomic
        } else {
            ReplaceMode::Overwrite
        };

        Ok(SyncConfig {
            remote_url,
            target_path,
            temp_path,
            permissions,
            interval,
            timeout,
            missing_target: self.missing_target.unwrap_or_default(),
            replace,
        })
    }

    /// `build_at` convenience wrapper using the current user's home directory.
    pub fn build(self) -> Result<SyncConfig, ConfigError> {
        let home = dirs::home_dir();
        self.build_at(home.as_deref())
    }
}

fn validate_remote(remote: Option<String>) -> Result<String, ConfigError> {
    let url = remote.map(|r| r.trim().to_string()).unwrap_or_default();
    if url.is_empty() {
        return Err(ConfigError::MissingRemote);
    }
    let lower = url.to_ascii_lowercase();
    let Some(rest) = lower
        .strip_prefix("http://")
        .or_else(|| lower.strip_prefix("https://"))
    else {
        return Err(ConfigError::InvalidRemote {
            url,
            reason: "scheme must be http or https".to_string(),
        });
    };
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ConfigError::InvalidRemote {
            url,
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}
