//! pollkeys — keep a local file (typically `authorized_keys`) in sync with a
//! remote URL.
//!
//! # Usage
//!
//! ```text
//! pollkeys --remote <url> [--path <file>] [--temp <file>] [--perms 0644]
//!          [--interval 0|30s|5m|...] [--timeout <dur>] [--create-missing]
//!          [--atomic] [--config <yaml>] [--log-format text|json]
//! ```
//!
//! Go-style single-dash flags (`-remote <url>`) are accepted as well.

mod args;

use anyhow::{Context, Result};
use clap::Parser;

use args::{normalize_go_flags, Cli};
use pollkeys_daemon::{init_tracing, Poller};

fn main() -> Result<()> {
    let cli = Cli::parse_from(normalize_go_flags(std::env::args_os()));
    init_tracing(cli.log_format);

    let config = cli.resolve().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    Poller::from_config(&config)
        .run()
        .map(|_| ())
        .context("synchronization failed")
}
