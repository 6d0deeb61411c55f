//! Command-line arguments and their conversion into a [`SyncConfig`].

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use pollkeys_core::{ConfigBuilder, ConfigError, MissingTargetPolicy, SyncConfig};
use pollkeys_daemon::LogFormat;

/// Long options that may also be spelled with a single dash (`-remote x`).
const LONG_FLAGS: &[&str] = &[
    "remote",
    "target",
    "path",
    "out",
    "temp",
    "perms",
    "interval",
    "timeout",
    "create-missing",
    "atomic",
    "config",
    "log-format",
    "help",
    "version",
];

#[derive(Parser, Debug)]
#[command(
    name = "pollkeys",
    version,
    about = "Keep a local file in sync with a remote URL",
    long_about = None,
)]
pub struct Cli {
    /// Remote url of the file to synchronize.
    #[arg(long, visible_alias = "target", value_name = "URL")]
    pub remote: Option<String>,

    /// Local path of the file to synchronize [default: ~/.ssh/authorized_keys].
    #[arg(long, visible_alias = "out", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Temporary save location of the downloaded file [default: /tmp/keys.txt].
    #[arg(long, value_name = "PATH")]
    pub temp: Option<PathBuf>,

    /// Permissions for the saved file, always octal: 420 means 0o420, not 0o644 [default: 0644].
    #[arg(long, value_name = "MODE")]
    pub perms: Option<String>,

    /// Interval to poll the remote file, e.g. 30s or 1h30m. 0 polls once then exits [default: 0].
    #[arg(long, value_name = "DURATION", allow_hyphen_values = true)]
    pub interval: Option<String>,

    /// Give up on a download after this long [default: no timeout].
    #[arg(long, value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Create the local file if it does not exist instead of failing.
    #[arg(long)]
    pub create_missing: bool,

    /// Replace the local file via a temporary sibling and rename.
    #[arg(long)]
    pub atomic: bool,

    /// YAML file with default values; flags take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log output format: text or json.
    #[arg(long, value_name = "FORMAT", default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Cli {
    /// The flag layer; unset flags stay `None` so file values show through.
    pub fn overrides(&self) -> ConfigBuilder {
        ConfigBuilder {
            remote: self.remote.clone(),
            path: self.path.clone(),
            temp: self.temp.clone(),
            perms: self.perms.clone().map(Into::into),
            interval: self.interval.clone().map(Into::into),
            timeout: self.timeout.clone().map(Into::into),
            missing_target: self.create_missing.then_some(MissingTargetPolicy::Create),
            atomic: self.atomic.then_some(true),
        }
    }

    /// Merge the optional config file with the flags and validate.
    pub fn resolve(&self) -> Result<SyncConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => ConfigBuilder::from_file(path)?,
            None => ConfigBuilder::default(),
        };
        base.merge(self.overrides()).build()
    }
}

/// Rewrite single-dash long options (`-remote`, `-perms=0600`) to their
/// double-dash form. Everything after a bare `--` is left alone.
pub fn normalize_go_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;
    for (i, arg) in args.into_iter().enumerate() {
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }
        if arg == "--" {
            passthrough = true;
            out.push(arg);
            continue;
        }
        let rewritten = arg.to_str().and_then(|s| {
            let rest = s.strip_prefix('-')?;
            if rest.starts_with('-') {
                return None;
            }
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            LONG_FLAGS.contains(&name).then(|| OsString::from(format!("-{s}")))
        });
        out.push(rewritten.unwrap_or(arg));
    }
    out
}
