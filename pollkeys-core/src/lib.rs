//! pollkeys core library — configuration types, parsing, errors.
//!
//! - [`types`] — `FileMode`, `PollInterval` and the replace/missing-target policies
//! - [`config`] — layered [`ConfigBuilder`] and the validated [`SyncConfig`]
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigBuilder, RawValue, SyncConfig};
pub use error::ConfigError;
pub use types::{FileMode, MissingTargetPolicy, PollInterval, ReplaceMode};
