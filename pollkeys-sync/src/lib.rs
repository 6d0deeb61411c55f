//! # pollkeys-sync
//!
//! Hash-gated replacement of a local file from a remote URL.
//!
//! Build a [`Synchronizer`] (usually via [`Synchronizer::from_config`]) and
//! call [`Synchronizer::synchronize`] once per poll cycle.

pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod synchronizer;
pub mod writer;

pub use error::SyncError;
pub use fetch::{Fetch, HttpFetcher};
pub use fingerprint::Fingerprint;
pub use synchronizer::{SyncOutcome, Synchronizer};
pub use writer::{DiskWriter, Overwrite};
