//! Poll loop: one synchronization per interval, errors logged and survived.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pollkeys_core::{PollInterval, SyncConfig};
use pollkeys_sync::{
    DiskWriter, Fetch, HttpFetcher, Overwrite, SyncError, SyncOutcome, Synchronizer,
};

/// Running tally of poll cycles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: usize,
    pub replaced: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl CycleStats {
    fn record(&mut self, result: &Result<SyncOutcome, SyncError>) {
        self.cycles += 1;
        match result {
            Ok(outcome) if outcome.is_replaced() => self.replaced += 1,
            Ok(_) => self.unchanged += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Drives a [`Synchronizer`] for one target on a fixed schedule.
pub struct Poller<F = HttpFetcher, W = DiskWriter> {
    synchronizer: Synchronizer<F, W>,
    target: PathBuf,
    remote_url: String,
    interval: PollInterval,
}

impl Poller {
    pub fn from_config(config: &SyncConfig) -> Self {
        Poller::new(
            Synchronizer::from_config(config),
            config.target_path.clone(),
            config.remote_url.clone(),
            config.interval,
        )
    }
}

impl<F: Fetch, W: Overwrite> Poller<F, W> {
    pub fn new(
        synchronizer: Synchronizer<F, W>,
        target: impl Into<PathBuf>,
        remote_url: impl Into<String>,
        interval: PollInterval,
    ) -> Self {
        Self {
            synchronizer,
            target: target.into(),
            remote_url: remote_url.into(),
            interval,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn interval(&self) -> PollInterval {
        self.interval
    }

    /// One synchronization attempt; failures are logged and returned.
    pub fn cycle(&self) -> Result<SyncOutcome, SyncError> {
        let result = self.synchronizer.synchronize(&self.target, &self.remote_url);
        if let Err(err) = &result {
            tracing::error!("error during synchronization: {err}");
        }
        result
    }

    /// Run according to the configured interval.
    ///
    /// With a zero interval this is a single [`Poller::cycle`] and its result.
    /// Otherwise it never returns: every cycle is followed by a sleep of
    /// exactly one interval, whatever the previous cycle's result.
    pub fn run(&self) -> Result<SyncOutcome, SyncError> {
        let first = self.cycle();
        if self.interval.is_once() {
            return first;
        }

        tracing::info!("polling {} every {}", self.remote_url, self.interval);
        let mut stats = CycleStats::default();
        stats.record(&first);
        loop {
            std::thread::sleep(self.interval.period());
            stats.record(&self.cycle());
            tracing::debug!(?stats, "cycle finished");
        }
    }

    /// Run exactly `cycles` cycles, calling `sleep` with the interval between
    /// consecutive ones.
    pub fn run_cycles(&self, cycles: usize, mut sleep: impl FnMut(Duration)) -> CycleStats {
        let mut stats = CycleStats::default();
        for n in 0..cycles {
            if n > 0 {
                sleep(self.interval.period());
            }
            stats.record(&self.cycle());
        }
        stats
    }
}
