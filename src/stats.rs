//! Run statistics.
//!
//! [`Stats`] is shared by the walker and every worker. All counters are
//! atomics, so recording a result never waits on another task and
//! [`Stats::snapshot`] can be taken at any time while the run is going.
//!
//! ```rust
//! use dirmirror::stats::Stats;
//!
//! let stats = Stats::new();
//! stats.record_discovered(3);
//! assert_eq!(stats.snapshot().discovered, 3);
//! assert_eq!(stats.snapshot().completed(), 0);
//! ```

use crate::download::{Outcome, TransferResult};
use crate::error::ErrorKind;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use url::Url;

/// Counters of one mirroring run.
#[derive(Debug)]
pub struct Stats {
    discovered: AtomicU64,
    succeeded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    listing_failures: AtomicU64,
    bytes_transferred: AtomicU64,
    started: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            discovered: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            listing_failures: AtomicU64::new(0),
            bytes_transferred: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Files handed to the workers.
    pub fn record_discovered(&self, count: u64) {
        self.discovered.fetch_add(count, Ordering::Relaxed);
    }

    /// Account for one finished transfer. Call exactly once per result.
    pub fn record(&self, result: &TransferResult) {
        let counter = match result.outcome() {
            Outcome::Success => &self.succeeded,
            Outcome::Skipped(_) => &self.skipped,
            Outcome::Failed(..) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.bytes_transferred
            .fetch_add(result.bytes_transferred(), Ordering::Relaxed);
    }

    pub fn record_listing_failure(&self) {
        self.listing_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            listing_failures: self.listing_failures.load(Ordering::Relaxed),
            bytes_transferred: self.bytes_transferred.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the [`Stats`] counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub discovered: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub listing_failures: u64,
    pub bytes_transferred: u64,
}

impl StatsSnapshot {
    /// Files that reached a final outcome.
    pub fn completed(&self) -> u64 {
        self.succeeded + self.skipped + self.failed
    }
}

/// A subtree that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFailure {
    pub url: Url,
    pub kind: ErrorKind,
    pub reason: String,
}

/// Final report of a run.
#[derive(Debug, Clone)]
pub struct MirrorSummary {
    pub stats: StatsSnapshot,
    pub elapsed: Duration,
    /// The run was stopped before the tree was exhausted.
    pub cancelled: bool,
    pub failed_transfers: Vec<TransferResult>,
    pub failed_listings: Vec<ListingFailure>,
}

impl MirrorSummary {
    /// Percentage of attempted transfers that succeeded.
    ///
    /// Skipped files were not attempted. Returns `None` when nothing was.
    pub fn success_rate(&self) -> Option<f64> {
        let attempted = self.stats.succeeded + self.stats.failed;
        if attempted == 0 {
            return None;
        }
        Some(self.stats.succeeded as f64 / attempted as f64 * 100.0)
    }

    /// Attempted transfers per second of wall time.
    pub fn files_per_second(&self) -> f64 {
        let attempted = self.stats.succeeded + self.stats.failed;
        attempted as f64 / (self.elapsed.as_secs_f64() + 0.001)
    }

    /// Whether every discovered file and every listing made it.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.stats.failed == 0 && self.stats.listing_failures == 0
    }
}

impl fmt::Display for MirrorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "Discovered:       {} files", s.discovered)?;
        writeln!(f, "Downloaded:       {} files", s.succeeded)?;
        writeln!(f, "Failed:           {} files", s.failed)?;
        writeln!(f, "Skipped:          {} files", s.skipped)?;
        writeln!(f, "Listing failures: {}", s.listing_failures)?;
        if let Some(rate) = self.success_rate() {
            writeln!(f, "Success rate:     {:.1}%", rate)?;
        }
        writeln!(f, "Transferred:      {} bytes", s.bytes_transferred)?;
        writeln!(f, "Elapsed:          {:.1} s", self.elapsed.as_secs_f64())?;
        write!(f, "Average speed:    {:.2} files/s", self.files_per_second())?;
        if self.cancelled {
            write!(f, "\nThe run was cancelled before completion.")?;
        }
        Ok(())
    }
}
