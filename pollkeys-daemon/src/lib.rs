//! Poll loop and log setup for the `pollkeys` binary.

pub mod logging;
mod runtime;

pub use logging::{init_tracing, LogFormat};
pub use runtime::{CycleStats, Poller};
